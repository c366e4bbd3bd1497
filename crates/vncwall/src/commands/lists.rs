//! Named-list command handlers.

use tabled::Tabled;

use vncwall_core::{Command as CoreCommand, Dashboard, NamedLists};

use crate::cli::{ListsArgs, ListsCommand};
use crate::error::CliError;
use crate::output;

use super::{OutputOpts, util};

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "List")]
    name: String,
    #[tabled(rename = "Servers")]
    count: usize,
    #[tabled(rename = "Members")]
    members: String,
}

fn render_table(lists: &NamedLists) -> String {
    let rows: Vec<ListRow> = lists
        .iter()
        .map(|(name, ips)| ListRow {
            name: name.clone(),
            count: ips.len(),
            members: ips.join(", "),
        })
        .collect();
    tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string()
}

pub async fn handle(
    dashboard: &Dashboard,
    args: ListsArgs,
    out: &OutputOpts,
) -> Result<(), CliError> {
    match args.command {
        ListsCommand::Show => {
            let lists = dashboard.refresh_lists().await?;
            let rendered = output::render_single(out.format, &lists, render_table, |l| {
                l.keys().cloned().collect::<Vec<_>>().join("\n")
            });
            output::print_output(&rendered, out.quiet);
            Ok(())
        }

        ListsCommand::Create { name } => {
            dashboard
                .execute(CoreCommand::CreateList { name: name.clone() })
                .await?;
            out.status(&format!("List '{}' created", name.trim()));
            Ok(())
        }

        ListsCommand::Delete { names } => {
            let prompt = match names.as_slice() {
                [one] => format!("Delete list '{one}'?"),
                _ => format!("Delete {} lists?", names.len()),
            };
            if !util::confirm("lists delete", &prompt, out.yes)? {
                return Ok(());
            }
            let count = names.len();
            dashboard.execute(CoreCommand::DeleteLists { names }).await?;
            out.status(&format!("Deleted {count} list(s)"));
            Ok(())
        }

        ListsCommand::Add { list, ips } => {
            let summary = util::describe_ips(&ips);
            dashboard
                .execute(CoreCommand::AddToLists {
                    lists: vec![list.clone()],
                    ips,
                })
                .await?;
            out.status(&format!("Added {summary} to '{list}'"));
            Ok(())
        }

        ListsCommand::Remove { list, ips } => {
            let summary = util::describe_ips(&ips);
            dashboard
                .execute(CoreCommand::RemoveFromLists {
                    lists: vec![list.clone()],
                    ips,
                })
                .await?;
            out.status(&format!("Removed {summary} from '{list}'"));
            Ok(())
        }
    }
}
