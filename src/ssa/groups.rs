use std::collections::BTreeSet;

use log::debug;

use crate::error::{Result, SsaError};

pub const ORIGINAL: &str = "original";
pub const FULL_RECONSTRUCTION: &str = "full_reconstruction";
pub const RESIDUAL: &str = "residual";

/// Names that are always resolvable and cannot be used for user groups.
pub const RESERVED_NAMES: [&str; 3] = [ORIGINAL, FULL_RECONSTRUCTION, RESIDUAL];

/// Component indices given for one user group: a single index or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSpec {
    Single(usize),
    Many(Vec<usize>),
}

impl GroupSpec {
    /// Sorted, de-duplicated indices.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            GroupSpec::Single(i) => vec![*i],
            GroupSpec::Many(list) => list
                .iter()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }
}

impl From<usize> for GroupSpec {
    fn from(index: usize) -> Self {
        GroupSpec::Single(index)
    }
}

impl From<Vec<usize>> for GroupSpec {
    fn from(indices: Vec<usize>) -> Self {
        GroupSpec::Many(indices)
    }
}

impl From<&[usize]> for GroupSpec {
    fn from(indices: &[usize]) -> Self {
        GroupSpec::Many(indices.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for GroupSpec {
    fn from(indices: [usize; N]) -> Self {
        GroupSpec::Many(indices.to_vec())
    }
}

impl From<std::ops::Range<usize>> for GroupSpec {
    fn from(indices: std::ops::Range<usize>) -> Self {
        GroupSpec::Many(indices.collect())
    }
}

/// What a group name resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedGroup {
    /// The input series itself, no reconstruction involved
    Original,
    Indices(Vec<usize>),
}

impl ResolvedGroup {
    pub fn indices(&self) -> Option<&[usize]> {
        match self {
            ResolvedGroup::Original => None,
            ResolvedGroup::Indices(indices) => Some(indices),
        }
    }
}

/// User-defined named index groups, kept in definition order.
///
/// Only the user mapping is stored. Reserved groups are derived from the
/// component count on every query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRegistry {
    groups: Vec<(String, Vec<usize>)>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_groups(&self) -> &[(String, Vec<usize>)] {
        &self.groups
    }

    fn get(&self, name: &str) -> Option<&Vec<usize>> {
        self.groups
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, indices)| indices)
    }

    /// Validates `incoming` against `component_count` and applies it.
    ///
    /// Without `append` the whole mapping is replaced. With `append`, names
    /// already present are replaced in place only if `overwrite` is set,
    /// otherwise the call fails, and new names go to the end. Nothing is
    /// modified when an error is returned.
    pub fn define<I, K, V>(
        &mut self,
        incoming: I,
        component_count: usize,
        append: bool,
        overwrite: bool,
    ) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<GroupSpec>,
    {
        let mut staged: Vec<(String, Vec<usize>)> = Vec::new();
        for (name, spec) in incoming {
            let name = name.into();
            let indices = spec.into().indices();
            check_name(&name)?;
            if staged.iter().any(|(existing, _)| *existing == name) {
                return Err(SsaError::GroupDefinition(format!(
                    "group '{}' is defined twice",
                    name
                )));
            }
            if let Some(bad) = indices.iter().find(|&&i| i >= component_count) {
                return Err(SsaError::GroupDefinition(format!(
                    "group '{}' has index {} but only {} components exist",
                    name, bad, component_count
                )));
            }
            staged.push((name, indices));
        }

        if !append {
            debug!("Replacing user groups with {} groups", staged.len());
            self.groups = staged;
            return Ok(());
        }

        if !overwrite {
            if let Some((conflict, _)) = staged.iter().find(|(name, _)| self.get(name).is_some()) {
                return Err(SsaError::GroupDefinition(format!(
                    "group '{}' already exists, pass overwrite to replace it",
                    conflict
                )));
            }
        }
        debug!("Merging {} groups into {} user groups", staged.len(), self.groups.len());
        for (name, indices) in staged {
            match self.groups.iter_mut().find(|(existing, _)| *existing == name) {
                Some((_, slot)) => *slot = indices,
                None => self.groups.push((name, indices)),
            }
        }
        Ok(())
    }

    /// Indices not claimed by any user group.
    pub fn residual(&self, component_count: usize) -> Vec<usize> {
        let claimed: BTreeSet<usize> = self
            .groups
            .iter()
            .flat_map(|(_, indices)| indices.iter().copied())
            .collect();
        (0..component_count).filter(|i| !claimed.contains(i)).collect()
    }

    /// Names in display order: original, full reconstruction, user groups in
    /// definition order, residual.
    pub fn names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.groups.len() + 3);
        names.push(ORIGINAL.to_string());
        names.push(FULL_RECONSTRUCTION.to_string());
        names.extend(self.groups.iter().map(|(name, _)| name.clone()));
        names.push(RESIDUAL.to_string());
        names
    }

    pub fn lookup(&self, name: &str, component_count: usize) -> Result<ResolvedGroup> {
        match name {
            ORIGINAL => Ok(ResolvedGroup::Original),
            FULL_RECONSTRUCTION => Ok(ResolvedGroup::Indices((0..component_count).collect())),
            RESIDUAL => Ok(ResolvedGroup::Indices(self.residual(component_count))),
            user => self
                .get(user)
                .map(|indices| ResolvedGroup::Indices(indices.clone()))
                .ok_or_else(|| SsaError::Lookup(user.to_string())),
        }
    }

    /// Every group name with its resolution, in [`GroupRegistry::names`] order.
    pub fn resolve_all(&self, component_count: usize) -> Vec<(String, ResolvedGroup)> {
        let mut resolved = Vec::with_capacity(self.groups.len() + 3);
        resolved.push((ORIGINAL.to_string(), ResolvedGroup::Original));
        resolved.push((
            FULL_RECONSTRUCTION.to_string(),
            ResolvedGroup::Indices((0..component_count).collect()),
        ));
        for (name, indices) in &self.groups {
            resolved.push((name.clone(), ResolvedGroup::Indices(indices.clone())));
        }
        resolved.push((
            RESIDUAL.to_string(),
            ResolvedGroup::Indices(self.residual(component_count)),
        ));
        resolved
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SsaError::GroupDefinition(
            "group names must not be empty".to_string(),
        ));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(SsaError::GroupDefinition(format!(
            "'{}' is a reserved group name",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residual_is_complement() {
        let mut registry = GroupRegistry::new();
        registry
            .define([("trend", vec![0usize]), ("season", vec![1usize, 2])], 6, false, false)
            .unwrap();
        assert_eq!(registry.residual(6), vec![3, 4, 5]);
        assert_eq!(
            registry.lookup(RESIDUAL, 6).unwrap(),
            ResolvedGroup::Indices(vec![3, 4, 5])
        );
        assert_eq!(GroupRegistry::new().residual(3), vec![0, 1, 2]);
    }

    #[test]
    fn test_group_index_forms() {
        assert_eq!(GroupSpec::from(3usize).indices(), vec![3]);
        assert_eq!(GroupSpec::from(vec![4usize, 1, 4]).indices(), vec![1, 4]);
        assert_eq!(GroupSpec::from([2usize, 0]).indices(), vec![0, 2]);
        assert_eq!(GroupSpec::from(1usize..4).indices(), vec![1, 2, 3]);
        assert_eq!(GroupSpec::from(&[5usize][..]).indices(), vec![5]);
    }

    #[test]
    fn test_replace_without_append() {
        let mut registry = GroupRegistry::new();
        registry.define([("a", 0usize)], 4, false, false).unwrap();
        registry.define([("b", 1usize)], 4, false, false).unwrap();
        assert_eq!(registry.user_groups(), &[("b".to_string(), vec![1])]);
    }

    #[test]
    fn test_append_conflict_leaves_mapping_untouched() {
        let mut registry = GroupRegistry::new();
        registry.define([("a", vec![0usize, 1])], 5, false, false).unwrap();
        let before = registry.clone();

        let err = registry
            .define([("c", vec![3usize]), ("a", vec![2usize])], 5, true, false)
            .unwrap_err();
        assert!(matches!(err, SsaError::GroupDefinition(_)));
        assert_eq!(registry, before);

        registry
            .define([("c", vec![3usize]), ("a", vec![2usize])], 5, true, true)
            .unwrap();
        // "a" keeps its slot, "c" is appended
        assert_eq!(
            registry.user_groups(),
            &[("a".to_string(), vec![2]), ("c".to_string(), vec![3])]
        );
        assert_eq!(registry.residual(5), vec![0, 1, 4]);
    }

    #[test]
    fn test_rejects_bad_definitions() {
        let mut registry = GroupRegistry::new();
        registry.define([("keep", 0usize)], 3, false, false).unwrap();
        let before = registry.clone();

        for name in RESERVED_NAMES {
            assert!(registry.define([(name, 0usize)], 3, false, false).is_err());
        }
        assert!(registry.define([("", 0usize)], 3, false, false).is_err());
        assert!(registry
            .define([("ok", 1usize), ("far", 3usize)], 3, false, false)
            .is_err());
        assert!(registry
            .define([("twice", 1usize), ("twice", 2usize)], 3, true, false)
            .is_err());
        assert_eq!(registry, before);
    }

    #[test]
    fn test_names_and_lookup() {
        let mut registry = GroupRegistry::new();
        registry
            .define([("zeta", vec![2usize]), ("alpha", vec![0usize])], 4, false, false)
            .unwrap();
        assert_eq!(
            registry.names(),
            vec!["original", "full_reconstruction", "zeta", "alpha", "residual"]
        );
        assert_eq!(registry.lookup(ORIGINAL, 4).unwrap(), ResolvedGroup::Original);
        assert_eq!(
            registry.lookup(FULL_RECONSTRUCTION, 4).unwrap(),
            ResolvedGroup::Indices(vec![0, 1, 2, 3])
        );
        assert_eq!(
            registry.lookup("nope", 4).unwrap_err(),
            SsaError::Lookup("nope".to_string())
        );

        let all = registry.resolve_all(4);
        let names: Vec<_> = all.iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names, registry.names());
        assert_eq!(all[4].1, ResolvedGroup::Indices(vec![1, 3]));
    }

    #[test]
    fn test_definition_order_survives_appends() {
        let mut registry = GroupRegistry::new();
        registry.define([("noise", vec![5usize])], 8, false, false).unwrap();
        registry
            .define([("trend", vec![0usize]), ("cycle", vec![1usize, 2])], 8, true, false)
            .unwrap();
        registry.define([("noise", vec![6usize])], 8, true, true).unwrap();
        assert_eq!(
            registry.names(),
            vec!["original", "full_reconstruction", "noise", "trend", "cycle", "residual"]
        );
        assert_eq!(registry.lookup("noise", 8).unwrap(), ResolvedGroup::Indices(vec![6]));
    }
}
