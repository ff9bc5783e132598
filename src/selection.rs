//! The ordered set of services chosen for one run.

use crate::error::{Error, Result};
use crate::service::Service;

/// Services selected for a run, in execution order.
///
/// At most one primary application is present, and when present it is last so
/// every library it links is set up before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    services: Vec<Service>,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Order `services` for execution.
    ///
    /// Fails with [`Error::SelectionConflict`] when two primary applications
    /// were chosen together. Otherwise the primary (if any) moves to the end
    /// and everything else keeps its relative order.
    pub fn normalize(services: Vec<Service>) -> Result<Self> {
        let primaries: Vec<&str> = services
            .iter()
            .filter(|s| s.kind.primary)
            .map(|s| s.name.as_str())
            .collect();
        if let [first, second, ..] = primaries.as_slice() {
            return Err(Error::SelectionConflict {
                first: first.to_string(),
                second: second.to_string(),
            });
        }

        let (mut ordered, primary): (Vec<Service>, Vec<Service>) =
            services.into_iter().partition(|s| !s.kind.primary);
        ordered.extend(primary);
        Ok(Self { services: ordered })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Service> {
        self.services.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.services.iter().map(|s| s.name.clone()).collect()
    }

    /// Names of the selected libraries that primaries link in.
    pub fn ion_names(&self) -> Vec<String> {
        self.services
            .iter()
            .filter(|s| s.kind.ion)
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn retain(&mut self, keep: impl FnMut(&Service) -> bool) {
        self.services.retain(keep);
    }
}

impl IntoIterator for Selection {
    type Item = Service;
    type IntoIter = std::vec::IntoIter<Service>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceDefinition;

    fn service(name: &str, primary: bool, ion: bool) -> Service {
        let mut def = ServiceDefinition::new(name);
        def.primary = primary;
        def.ion = ion;
        Service::from_definition(&def)
    }

    #[test]
    fn test_primary_moves_last() {
        let selection = Selection::normalize(vec![
            service("member-app", true, false),
            service("ion-core", false, true),
            service("api", false, false),
        ])
        .unwrap();
        assert_eq!(selection.names(), vec!["ion-core", "api", "member-app"]);
    }

    #[test]
    fn test_order_kept_without_primary() {
        let selection = Selection::normalize(vec![
            service("c", false, false),
            service("a", false, false),
            service("b", false, false),
        ])
        .unwrap();
        assert_eq!(selection.names(), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_two_primaries_conflict() {
        let err = Selection::normalize(vec![
            service("member-app", true, false),
            service("ion-core", false, true),
            service("admin-app", true, false),
        ])
        .unwrap_err();
        match err {
            Error::SelectionConflict { first, second } => {
                assert_eq!(first, "member-app");
                assert_eq!(second, "admin-app");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ion_names_and_retain() {
        let mut selection = Selection::normalize(vec![
            service("ion-core", false, true),
            service("ion-ui", false, true),
            service("member-app", true, false),
        ])
        .unwrap();
        assert_eq!(selection.ion_names(), vec!["ion-core", "ion-ui"]);

        selection.retain(|s| s.name != "ion-ui");
        assert_eq!(selection.ion_names(), vec!["ion-core"]);
        assert!(selection.get("ion-ui").is_none());
        assert_eq!(selection.len(), 2);
    }

    #[test]
    fn test_empty_selection() {
        let selection = Selection::normalize(Vec::new()).unwrap();
        assert!(selection.is_empty());
        assert_eq!(selection, Selection::empty());
    }
}
