// ── Named list helpers ──
//
// Pure functions over the `GET /api/lists` map. The reserved
// "All Servers" entry is never treated as a custom list.

use vncwall_api::{ALL_SERVERS_LIST, ListAction, ListMutation, NamedLists};

use crate::error::CoreError;

pub fn is_reserved(name: &str) -> bool {
    name == ALL_SERVERS_LIST
}

/// Custom list names, in backend order.
pub fn custom_list_names(lists: &NamedLists) -> Vec<String> {
    lists
        .keys()
        .filter(|name| !is_reserved(name))
        .cloned()
        .collect()
}

pub fn has_custom_lists(lists: &NamedLists) -> bool {
    lists.keys().any(|name| !is_reserved(name))
}

/// Lists to pre-tick in the membership dialog.
///
/// For `add`, the lists that contain none of `ips`; for `remove`, the
/// lists that contain at least one of them.
pub fn preselected_lists(lists: &NamedLists, ips: &[String], action: ListAction) -> Vec<String> {
    lists
        .iter()
        .filter(|(name, _)| !is_reserved(name))
        .filter(|(_, members)| {
            let any_member = ips.iter().any(|ip| members.contains(ip));
            match action {
                ListAction::Add => !any_member,
                ListAction::Remove => any_member,
            }
        })
        .map(|(name, _)| name.clone())
        .collect()
}

/// One request per target list, carrying only the ips that would change.
/// Lists with nothing to do produce no request.
pub fn plan_membership(
    lists: &NamedLists,
    targets: &[String],
    ips: &[String],
    action: ListAction,
) -> Result<Vec<ListMutation>, CoreError> {
    let mut plan = Vec::new();
    for target in targets {
        if is_reserved(target) {
            return Err(CoreError::validation(format!(
                "\"{ALL_SERVERS_LIST}\" cannot be modified"
            )));
        }
        let members = lists.get(target).ok_or_else(|| CoreError::ListNotFound {
            name: target.clone(),
        })?;
        let servers: Vec<String> = ips
            .iter()
            .filter(|ip| match action {
                ListAction::Add => !members.contains(ip),
                ListAction::Remove => members.contains(ip),
            })
            .cloned()
            .collect();
        if !servers.is_empty() {
            plan.push(ListMutation {
                action,
                list_name: target.clone(),
                servers,
            });
        }
    }
    Ok(plan)
}

/// Validate a new list name, returning it trimmed.
pub fn validate_new_name(lists: &NamedLists, name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("list name cannot be empty"));
    }
    if is_reserved(name) {
        return Err(CoreError::validation(format!("\"{name}\" is reserved")));
    }
    if lists.contains_key(name) {
        return Err(CoreError::validation(format!("list \"{name}\" already exists")));
    }
    Ok(name.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lists() -> NamedLists {
        let mut lists = NamedLists::new();
        lists.insert(ALL_SERVERS_LIST.into(), vec!["10.0.0.1".into()]);
        lists.insert("lab".into(), vec!["10.0.0.1".into(), "10.0.0.2".into()]);
        lists.insert("night".into(), vec!["10.0.0.3".into()]);
        lists.insert("empty".into(), Vec::new());
        lists
    }

    fn ips(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn custom_names_skip_reserved() {
        assert_eq!(custom_list_names(&lists()), ["lab", "night", "empty"]);
        assert!(has_custom_lists(&lists()));

        let mut only_all = NamedLists::new();
        only_all.insert(ALL_SERVERS_LIST.into(), Vec::new());
        assert!(!has_custom_lists(&only_all));
    }

    #[test]
    fn preselection_for_add_and_remove() {
        let selected = ips(&["10.0.0.1"]);
        assert_eq!(
            preselected_lists(&lists(), &selected, ListAction::Add),
            ["night", "empty"]
        );
        assert_eq!(
            preselected_lists(&lists(), &selected, ListAction::Remove),
            ["lab"]
        );
    }

    #[test]
    fn plan_add_skips_existing_members() {
        let plan = plan_membership(
            &lists(),
            &ips(&["lab", "night"]),
            &ips(&["10.0.0.1", "10.0.0.4"]),
            ListAction::Add,
        )
        .unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].list_name, "lab");
        assert_eq!(plan[0].servers, ["10.0.0.4"]);
        assert_eq!(plan[1].servers, ["10.0.0.1", "10.0.0.4"]);
    }

    #[test]
    fn plan_remove_only_present_members() {
        let plan = plan_membership(
            &lists(),
            &ips(&["lab", "night"]),
            &ips(&["10.0.0.2"]),
            ListAction::Remove,
        )
        .unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].list_name, "lab");
        assert_eq!(plan[0].action, ListAction::Remove);
    }

    #[test]
    fn plan_rejects_reserved_and_unknown() {
        let err = plan_membership(
            &lists(),
            &ips(&[ALL_SERVERS_LIST]),
            &ips(&["10.0.0.1"]),
            ListAction::Add,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));

        let err =
            plan_membership(&lists(), &ips(&["nope"]), &ips(&["10.0.0.1"]), ListAction::Add)
                .unwrap_err();
        assert!(matches!(err, CoreError::ListNotFound { .. }));
    }

    #[test]
    fn new_name_validation() {
        assert_eq!(validate_new_name(&lists(), "  ops  ").unwrap(), "ops");
        assert!(validate_new_name(&lists(), "   ").is_err());
        assert!(validate_new_name(&lists(), ALL_SERVERS_LIST).is_err());
        assert!(validate_new_name(&lists(), "lab").is_err());
    }
}
