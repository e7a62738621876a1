use crate::infra::vcs::traits::ReviewHost;

/// Review hosts available to a run, looked up by id.
#[derive(Default)]
pub struct HostRegistry {
    hosts: Vec<Box<dyn ReviewHost>>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a host. A host with the same id replaces the earlier one.
    pub fn register(&mut self, host: Box<dyn ReviewHost>) {
        self.hosts.retain(|existing| existing.id() != host.id());
        self.hosts.push(host);
    }

    pub fn get_host(&self, id: &str) -> Option<&dyn ReviewHost> {
        self.hosts
            .iter()
            .map(|host| host.as_ref())
            .find(|host| host.id() == id)
    }

    pub fn hosts(&self) -> Vec<&dyn ReviewHost> {
        self.hosts.iter().map(|host| host.as_ref()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::cli::diff::DiffSource;
    use crate::infra::vcs::github::{GitHubHost, parse_pr_ref};
    use crate::infra::vcs::local::LocalHost;

    #[test]
    fn test_lookup_by_id() {
        let mut registry = HostRegistry::new();
        registry.register(Box::new(LocalHost::new(DiffSource::GitStatus)));
        let pr = parse_pr_ref("o/r#3").expect("pr ref");
        registry.register(Box::new(GitHubHost::new(pr)));

        assert_eq!(registry.hosts().len(), 2);
        assert_eq!(registry.get_host("github").unwrap().name(), "GitHub");
        assert_eq!(registry.get_host("local").unwrap().name(), "Local");
        assert!(registry.get_host("gitlab").is_none());
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = HostRegistry::new();
        registry.register(Box::new(LocalHost::new(DiffSource::GitStatus)));
        registry.register(Box::new(LocalHost::new(DiffSource::Stash { index: 0 })));
        assert_eq!(registry.hosts().len(), 1);
    }
}
