//! Screen implementations. Each screen is a top-level Component.

pub mod grid;
pub mod lists;

use crate::component::Component;
use crate::screen::ScreenId;

pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Grid, Box::new(grid::GridScreen::new())),
        (ScreenId::Lists, Box::new(lists::ListsScreen::new())),
    ]
}
