// SPDX-License-Identifier: MIT

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec, vec::Vec};

use time::PrimitiveDateTime;
use vfatio::BlockIO;

use crate::{
    attr::FileAttributes,
    boot::BootParameters,
    dir::{DirEntry, DirIter},
    errors::*,
    utils::path_utils::{self, PathComponent},
};

/// Terminal entry of a path lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNode {
    pub name: String,
    pub attr: FileAttributes,
    pub size: u32,
    pub first_cluster: u32,
    pub is_root: bool,
}

impl ResolvedNode {
    fn root(params: &BootParameters, mount_time: PrimitiveDateTime) -> Self {
        Self {
            name: String::from("/"),
            attr: FileAttributes::new_dir(Some(mount_time)),
            size: 0,
            first_cluster: params.root_cluster,
            is_root: true,
        }
    }

    fn from_entry(entry: DirEntry) -> Self {
        Self {
            name: entry.name,
            attr: entry.attr,
            size: entry.size,
            first_cluster: entry.first_cluster,
            is_root: false,
        }
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.attr.dir
    }

    /// Directory cluster to list. A zero start cluster in a subdirectory
    /// entry refers to the root.
    #[inline]
    pub fn dir_cluster(&self, params: &BootParameters) -> u32 {
        if self.first_cluster == 0 {
            params.root_cluster
        } else {
            self.first_cluster
        }
    }
}

/// Walks paths from the root directory down to their terminal entry.
pub struct Resolver<'a, IO: BlockIO + ?Sized> {
    io: &'a IO,
    params: &'a BootParameters,
    mount_time: PrimitiveDateTime,
}

impl<'a, IO: BlockIO + ?Sized> Resolver<'a, IO> {
    pub fn new(io: &'a IO, params: &'a BootParameters, mount_time: PrimitiveDateTime) -> Self {
        Self {
            io,
            params,
            mount_time,
        }
    }

    pub fn root(&self) -> ResolvedNode {
        ResolvedNode::root(self.params, self.mount_time)
    }

    /// Resolves `path`, one directory scan per component.
    ///
    /// `.` stays in place and `..` goes up one level (never above the root).
    pub fn resolve(&self, path: &str) -> FsResult<ResolvedNode> {
        let mut stack = vec![self.root()];

        for component in path_utils::components(path) {
            let current = stack.last().ok_or(FsError::Invalid("Empty lookup stack"))?;
            ensure!(current.is_dir(), FsError::NotADirectory);

            match component {
                PathComponent::Current => {}
                PathComponent::Parent => {
                    if stack.len() > 1 {
                        stack.pop();
                    }
                }
                PathComponent::Name(name) => {
                    let found = self.find_in_dir(current.dir_cluster(self.params), name)?;
                    stack.push(ResolvedNode::from_entry(found));
                }
            }
        }

        stack.pop().ok_or(FsError::Invalid("Empty lookup stack"))
    }

    /// First entry of the directory at `cluster` whose long or short name
    /// matches `name`, case-insensitively.
    pub fn find_in_dir(&self, cluster: u32, name: &str) -> FsResult<DirEntry> {
        for entry in DirIter::new(self.io, self.params, cluster) {
            let entry = entry?;
            if entry.matches(name) {
                return Ok(entry);
            }
        }
        log::trace!("{name:?} not found in directory at cluster {cluster}");
        Err(FsError::NotFound)
    }

    /// Lazy listing of the directory designated by `node`.
    pub fn entries(&self, node: &ResolvedNode) -> FsResult<DirIter<'a, 'a, IO>> {
        ensure!(node.is_dir(), FsError::NotADirectory);
        Ok(DirIter::new(
            self.io,
            self.params,
            node.dir_cluster(self.params),
        ))
    }

    /// Decoded children of the directory at `path`.
    pub fn list(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let node = self.resolve(path)?;
        self.entries(&node)?.collect()
    }
}
