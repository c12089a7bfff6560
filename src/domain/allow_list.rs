use std::path::Path;

use crate::domain::errors::{DomainError, DomainResult};

/// Class names eligible for display, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllowList {
    names: Vec<String>,
}

impl AllowList {
    /// One name per line; lines are trimmed and blank ones skipped.
    pub fn parse(text: &str) -> Self {
        let names = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        Self { names }
    }

    pub fn load(path: &Path) -> DomainResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                DomainError::NotFound(format!("class file not found: {}", path.display()))
            }
            _ => DomainError::OperationFailed(format!("reading {}: {e}", path.display())),
        })?;
        Ok(Self::parse(&text))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_lines_and_trims() {
        let list = AllowList::parse("car\n\n  truck \r\n\nbike\n");
        assert_eq!(list.names(), ["car", "truck", "bike"]);
    }

    #[test]
    fn membership_is_exact() {
        let list = AllowList::parse("car\ntruck\n");
        assert!(list.contains("car"));
        assert!(!list.contains("Car"));
        assert!(!list.contains("person"));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = AllowList::load(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
