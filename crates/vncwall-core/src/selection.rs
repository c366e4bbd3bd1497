// ── Selection ──
//
// Checkbox state lives on the grid slots themselves, so a rebuilt tile
// starts unchecked and a full render clears everything. Only slots that
// hold a tile can be checked.

use serde::Serialize;

use crate::grid::Grid;

/// Flip the checkbox of `ip`. Returns the new state; `false` when no tile
/// is shown for `ip`.
pub fn toggle(grid: &Grid, ip: &str) -> bool {
    let mut now = false;
    grid.update_checks(|slot| {
        if slot.ip == ip {
            now = !slot.checked;
            now
        } else {
            slot.checked
        }
    });
    now
}

pub fn select_all(grid: &Grid) -> usize {
    grid.update_checks(|_| true)
}

pub fn invert(grid: &Grid) -> usize {
    grid.update_checks(|slot| !slot.checked)
}

pub fn cancel(grid: &Grid) {
    grid.update_checks(|_| false);
}

pub fn checked_ips(grid: &Grid) -> Vec<String> {
    grid.snapshot().checked_ips()
}

/// Which bulk-action controls are visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct BulkButtons {
    pub exclude: bool,
    pub include: bool,
    pub open: bool,
    pub invert: bool,
    pub cancel: bool,
    pub add_to_list: bool,
    pub remove_from_list: bool,
}

impl BulkButtons {
    pub fn compute(any_checked: bool, show_excluded: bool, has_custom_lists: bool) -> Self {
        let lists = any_checked && has_custom_lists;
        Self {
            exclude: any_checked && !show_excluded,
            include: any_checked && show_excluded,
            open: any_checked,
            invert: any_checked,
            cancel: any_checked,
            add_to_list: lists,
            remove_from_list: lists,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::render::TileRenderer;
    use crate::test_support::server;

    fn grid_with(ips: &[&str]) -> Grid {
        let grid = Grid::new();
        let renderer = TileRenderer::default();
        for ip in ips {
            grid.append(renderer.build(&server(ip, "user", false)));
        }
        grid
    }

    #[test]
    fn toggle_flips_one_slot() {
        let grid = grid_with(&["10.0.0.1", "10.0.0.2"]);
        assert!(toggle(&grid, "10.0.0.2"));
        assert_eq!(checked_ips(&grid), ["10.0.0.2"]);
        assert!(!toggle(&grid, "10.0.0.2"));
        assert!(checked_ips(&grid).is_empty());
    }

    #[test]
    fn toggle_unknown_ip_is_noop() {
        let grid = grid_with(&["10.0.0.1"]);
        assert!(!toggle(&grid, "10.0.0.9"));
        assert!(checked_ips(&grid).is_empty());
    }

    #[test]
    fn select_all_then_invert_then_cancel() {
        let grid = grid_with(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        toggle(&grid, "10.0.0.1");
        assert_eq!(invert(&grid), 2);
        assert_eq!(checked_ips(&grid), ["10.0.0.2", "10.0.0.3"]);

        assert_eq!(select_all(&grid), 3);
        cancel(&grid);
        assert!(!grid.snapshot().any_checked());
    }

    #[test]
    fn placeholder_slots_cannot_be_checked() {
        let grid = grid_with(&["10.0.0.1", "10.0.0.2"]);
        grid.show_placeholder("10.0.0.1").unwrap();
        assert_eq!(select_all(&grid), 1);
        assert_eq!(checked_ips(&grid), ["10.0.0.2"]);
    }

    #[test]
    fn rebuilt_tile_starts_unchecked() {
        let grid = grid_with(&["10.0.0.1"]);
        toggle(&grid, "10.0.0.1");
        let node = grid.show_placeholder("10.0.0.1").unwrap();
        grid.replace_if(
            "10.0.0.1",
            node,
            TileRenderer::default().build(&server("10.0.0.1", "user", true)),
        )
        .unwrap();
        assert!(checked_ips(&grid).is_empty());
    }

    #[test]
    fn bulk_buttons_hidden_without_selection() {
        assert_eq!(BulkButtons::compute(false, false, true), BulkButtons::default());
    }

    #[test]
    fn bulk_buttons_follow_exclusion_view() {
        let normal = BulkButtons::compute(true, false, false);
        assert!(normal.exclude && !normal.include);
        assert!(normal.open && normal.invert && normal.cancel);
        assert!(!normal.add_to_list && !normal.remove_from_list);

        let excluded = BulkButtons::compute(true, true, true);
        assert!(!excluded.exclude && excluded.include);
        assert!(excluded.add_to_list && excluded.remove_from_list);
    }
}
