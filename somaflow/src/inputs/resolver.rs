//! Read-pair discovery.
//!
//! A cohort directory is listed when iteration starts, not when the source
//! is built, and every call to [`ReadPairSource::iter`] lists it again.

use super::{Cohort, ReadPair};
use crate::config::MateConvention;
use crate::errors::{InputIntegrityError, PipelineError};
use crate::store::ArtifactStore;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::vec::IntoIter;
use tracing::debug;

/// Resolves the read pairs of one cohort.
#[derive(Debug)]
pub struct ReadPairSource<'a> {
    cohort: &'a Cohort,
    store: &'a dyn ArtifactStore,
    convention: &'a MateConvention,
    first_mate: Regex,
}

impl<'a> ReadPairSource<'a> {
    /// Creates a source for `cohort` using the given naming convention.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the convention cannot be turned
    /// into a filename pattern.
    pub fn new(
        cohort: &'a Cohort,
        store: &'a dyn ArtifactStore,
        convention: &'a MateConvention,
    ) -> Result<Self, PipelineError> {
        let extensions = convention
            .extensions
            .iter()
            .map(|ext| regex::escape(ext))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(
            r"^(?P<rg>{}.*){}{}\.(?P<ext>{})$",
            regex::escape(&cohort.prefix),
            regex::escape(&convention.separator),
            regex::escape(&convention.first_marker),
            extensions,
        );
        let first_mate = Regex::new(&pattern)
            .map_err(|e| PipelineError::Config(format!("bad read file pattern '{pattern}': {e}")))?;

        Ok(Self {
            cohort,
            store,
            convention,
            first_mate,
        })
    }

    /// Lists the cohort directory and returns an iterator over its pairs.
    ///
    /// # Errors
    ///
    /// Returns `InputIntegrityError::UnreadableDirectory` if the directory
    /// cannot be listed.
    pub fn iter(&self) -> Result<ReadPairs<'_>, InputIntegrityError> {
        let listing = self.store.list(&self.cohort.directory).map_err(|e| {
            InputIntegrityError::UnreadableDirectory {
                directory: self.cohort.directory.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(ReadPairs {
            source: self,
            listing: listing.into_iter(),
            seen: HashMap::new(),
        })
    }

    /// Resolves every pair up front, failing on the first integrity error.
    ///
    /// # Errors
    ///
    /// Returns the first `InputIntegrityError` met while iterating.
    pub fn resolve_all(&self) -> Result<Vec<ReadPair>, InputIntegrityError> {
        self.iter()?.collect()
    }

    fn pair_for(&self, path: PathBuf) -> Option<Result<ReadPair, InputIntegrityError>> {
        let name = path.file_name()?.to_str()?;
        let caps = self.first_mate.captures(name)?;
        let read_group = caps.name("rg")?.as_str().to_string();
        let ext = caps.name("ext")?.as_str().to_string();
        if read_group.is_empty() {
            return None;
        }

        let second_name = format!(
            "{read_group}{}{}.{ext}",
            self.convention.separator, self.convention.second_marker
        );
        let second = self.cohort.directory.join(second_name);

        let present = match self.store.size(&second) {
            Ok(size) => size.is_some(),
            Err(e) => {
                return Some(Err(InputIntegrityError::UnreadableDirectory {
                    directory: self.cohort.directory.clone(),
                    reason: e.to_string(),
                }))
            }
        };
        if !present {
            return Some(Err(InputIntegrityError::missing_mate(path, second)));
        }

        Some(Ok(ReadPair::new(read_group, path, second)))
    }
}

/// Iterator over the read pairs of one listing.
#[derive(Debug)]
pub struct ReadPairs<'s> {
    source: &'s ReadPairSource<'s>,
    listing: IntoIter<PathBuf>,
    seen: HashMap<String, PathBuf>,
}

impl Iterator for ReadPairs<'_> {
    type Item = Result<ReadPair, InputIntegrityError>;

    fn next(&mut self) -> Option<Self::Item> {
        for path in self.listing.by_ref() {
            let Some(result) = self.source.pair_for(path) else {
                continue;
            };
            let pair = match result {
                Ok(pair) => pair,
                Err(e) => return Some(Err(e)),
            };

            if let Some(previous) = self.seen.get(&pair.read_group) {
                return Some(Err(InputIntegrityError::duplicate_read_group(
                    &self.source.cohort.label,
                    &pair.read_group,
                    previous,
                    &pair.first,
                )));
            }
            self.seen.insert(pair.read_group.clone(), pair.first.clone());

            debug!(
                cohort = %self.source.cohort.label,
                read_group = %pair.read_group,
                "Discovered read pair"
            );
            return Some(Ok(pair));
        }
        None
    }
}
