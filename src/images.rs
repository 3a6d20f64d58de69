//! Image identity and the name-to-index bijection.
//!
//! All internal computation works on dense integer indices; image names only
//! appear at the API boundary and in error messages. The mapping is fixed at
//! construction time and is a bijection over exactly the images taking part
//! in alignment.

use std::collections::HashMap;

use crate::error::{AlignError, Result};

/// The set of images participating in one alignment run.
#[derive(Debug, Clone)]
pub struct ImageSet {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl ImageSet {
    /// Build the bijection from an ordered list of image names.
    ///
    /// The position of a name in the list becomes its dense index. Duplicate
    /// names would break the bijection and are rejected.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(AlignError::DuplicateImage {
                    image: name.clone(),
                });
            }
        }
        Ok(Self { names, index })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Dense index of an image name, if it belongs to the set.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Image name for a dense index, if in range.
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// All image names in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
