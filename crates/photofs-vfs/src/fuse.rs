// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use fuser::{FileAttr, FileType, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, Request};
use photofs::OsError;

use crate::{Filesystem, NodeKind, RelativePath, Stat};

/// The inode of the filesystem root, as required by FUSE.
const ROOT_INODE: u64 = 1;

/// Maps between inode numbers and locations in the filesystem.
///
/// Nodes have no identity beyond their location, so an inode
/// is assigned to every location the kernel asks about.
#[derive(Debug)]
struct Inodes {
    next_inode: AtomicU64,
    paths: DashMap<u64, RelativePath>,
    inodes: DashMap<RelativePath, u64>,
}

impl Default for Inodes {
    fn default() -> Self {
        let table = Self {
            next_inode: AtomicU64::new(ROOT_INODE + 1),
            paths: DashMap::new(),
            inodes: DashMap::new(),
        };
        table.paths.insert(ROOT_INODE, RelativePath::root());
        table.inodes.insert(RelativePath::root(), ROOT_INODE);
        table
    }
}

impl Inodes {
    fn path(&self, ino: u64) -> Option<RelativePath> {
        self.paths.get(&ino).map(|p| p.value().clone())
    }

    fn get_or_allocate(&self, path: &RelativePath) -> u64 {
        if let Some(ino) = self.inodes.get(path) {
            return *ino;
        }
        *self.inodes.entry(path.clone()).or_insert_with(|| {
            let ino = self.next_inode.fetch_add(1, Ordering::Relaxed);
            self.paths.insert(ino, path.clone());
            ino
        })
    }

    fn forget(&self, path: &RelativePath) {
        if let Some((_, ino)) = self.inodes.remove(path) {
            self.paths.remove(&ino);
        }
    }
}

enum Handle {
    /// The contents of a generated file, as of when it was opened
    File(Arc<[u8]>),
    /// A directory listing, as of when it was opened
    Dir(Vec<(u64, FileType, String)>),
}

/// Extract the ok value from a result, or reply with an error in FUSE
macro_rules! unwrap {
    ($reply:ident, $op:expr) => {{
        match $op {
            Ok(r) => r,
            Err(err) => err!($reply, err),
        }
    }};
}

/// Reply with an error to FUSE and return
macro_rules! err {
    ($reply:ident, $err:expr) => {{
        let err = $err;
        tracing::debug!("{err:?}");
        let errno = err.os_error().unwrap_or(libc::EIO);
        $reply.error(errno);
        return;
    }};
}

/// Find the location of an inode, or reply with ENOENT and return
macro_rules! path {
    ($self:ident, $reply:ident, $ino:expr) => {{
        match $self.inodes.path($ino) {
            Some(path) => path,
            None => {
                $reply.error(libc::ENOENT);
                return;
            }
        }
    }};
}

/// Find the location of a named child of an inode,
/// or reply with an error and return
macro_rules! child {
    ($self:ident, $reply:ident, $parent:expr, $name:expr) => {{
        let parent = path!($self, $reply, $parent);
        let Some(name) = $name.to_str() else {
            $reply.error(libc::EINVAL);
            return;
        };
        parent.join(name)
    }};
}

/// Represents a connected FUSE session.
///
/// This implements the [`fuser::Filesystem`] trait, tracking inodes
/// and open handles while the [`Filesystem`] answers each request
/// by the path of the inode in question.
pub struct Session {
    fs: Filesystem,
    ttl: Duration,
    inodes: Inodes,
    next_handle: AtomicU64,
    handles: DashMap<u64, Handle>,
}

impl Session {
    // establish a block size to report, which is not accurate
    // but gives commands like du a realistic value to use
    const BLOCK_SIZE: u32 = 512;

    pub fn new(fs: Filesystem) -> Self {
        Self {
            fs,
            // every view is computed from the library on request,
            // so nothing may be cached by the kernel
            ttl: Duration::ZERO,
            inodes: Inodes::default(),
            // the 'empty/zero' handle value is never allocated
            next_handle: AtomicU64::new(1),
            handles: DashMap::new(),
        }
    }

    fn allocate_handle(&self, handle: Handle) -> u64 {
        let fh = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.handles.insert(fh, handle);
        fh
    }

    fn attr_from_stat(&self, ino: u64, stat: &Stat) -> FileAttr {
        let kind = file_type(stat.kind);
        let mtime = stat.mtime;
        let now = SystemTime::now();
        FileAttr {
            ino,
            size: stat.size,
            blocks: (stat.size / Self::BLOCK_SIZE as u64) + 1,
            atime: now,
            mtime,
            ctime: mtime,
            crtime: mtime,
            kind,
            perm: stat.perm,
            nlink: if stat.is_dir() { 2 } else { 1 },
            uid: self.fs.context().config.uid.as_raw(),
            gid: self.fs.context().config.gid.as_raw(),
            rdev: 0,
            blksize: Self::BLOCK_SIZE,
            flags: 0,
        }
    }

    fn entry(&self, path: &RelativePath, reply: ReplyEntry) {
        let stat = unwrap!(reply, self.fs.getattr(path));
        let ino = self.inodes.get_or_allocate(path);
        reply.entry(&self.ttl, &self.attr_from_stat(ino, &stat), 0);
    }
}

fn file_type(kind: NodeKind) -> FileType {
    match kind {
        NodeKind::Directory => FileType::Directory,
        NodeKind::Symlink => FileType::Symlink,
        NodeKind::File => FileType::RegularFile,
    }
}

// these functions mirror the actual fuse ones and
// so we don't have much control over the shape
#[allow(clippy::too_many_arguments)]
impl fuser::Filesystem for Session {
    fn init(
        &mut self,
        _req: &Request<'_>,
        _config: &mut fuser::KernelConfig,
    ) -> std::result::Result<(), libc::c_int> {
        tracing::info!("Filesystem initialized");
        Ok(())
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let path = child!(self, reply, parent, name);
        self.entry(&path, reply);
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: fuser::ReplyAttr) {
        let path = path!(self, reply, ino);
        let stat = unwrap!(reply, self.fs.getattr(&path));
        reply.attr(&self.ttl, &self.attr_from_stat(ino, &stat));
    }

    fn readlink(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyData) {
        let path = path!(self, reply, ino);
        let target = unwrap!(reply, self.fs.readlink(&path));
        reply.data(target.as_os_str().as_bytes());
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        let path = child!(self, reply, parent, name);
        unwrap!(reply, self.fs.mkdir(&path));
        self.entry(&path, reply);
    }

    fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let path = child!(self, reply, parent, name);
        unwrap!(reply, self.fs.unlink(&path));
        self.inodes.forget(&path);
        reply.ok();
    }

    fn rmdir(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let path = child!(self, reply, parent, name);
        unwrap!(reply, self.fs.rmdir(&path));
        self.inodes.forget(&path);
        reply.ok();
    }

    fn symlink(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        link_name: &OsStr,
        target: &Path,
        reply: ReplyEntry,
    ) {
        let path = child!(self, reply, parent, link_name);
        let created = unwrap!(reply, self.fs.symlink(target, &path));
        self.entry(&created, reply);
    }

    fn rename(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        let from = child!(self, reply, parent, name);
        let to = child!(self, reply, newparent, newname);
        unwrap!(reply, self.fs.rename(&from, &to));
        reply.ok();
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        if flags & libc::O_ACCMODE != libc::O_RDONLY {
            reply.error(libc::EACCES);
            return;
        }
        let path = path!(self, reply, ino);
        let data = unwrap!(reply, self.fs.read(&path));
        let fh = self.allocate_handle(Handle::File(data));
        reply.opened(fh, 0);
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(handle) = self.handles.get(&fh) else {
            reply.error(libc::EBADF);
            return;
        };
        let Handle::File(data) = handle.value() else {
            reply.error(libc::EISDIR);
            return;
        };
        let start = (offset.max(0) as usize).min(data.len());
        let end = start.saturating_add(size as usize).min(data.len());
        reply.data(&data[start..end]);
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        if self.handles.remove(&fh).is_none() {
            reply.error(libc::EBADF);
            return;
        }
        reply.ok();
    }

    fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        let path = path!(self, reply, ino);
        let listing = unwrap!(reply, self.fs.readdir(&path));
        let parent_ino = path
            .parent()
            .map(|parent| self.inodes.get_or_allocate(&parent))
            .unwrap_or(ROOT_INODE);
        let mut entries = vec![
            (ino, FileType::Directory, String::from(".")),
            (parent_ino, FileType::Directory, String::from("..")),
        ];
        for (name, kind) in listing {
            if name == "." || name == ".." {
                continue;
            }
            let child_ino = self.inodes.get_or_allocate(&path.join(&name));
            entries.push((child_ino, file_type(kind), name));
        }
        let fh = self.allocate_handle(Handle::Dir(entries));
        reply.opened(fh, 0);
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let Some(handle) = self.handles.get(&fh) else {
            reply.error(libc::EBADF);
            return;
        };
        let Handle::Dir(entries) = handle.value() else {
            reply.error(libc::ENOTDIR);
            return;
        };
        // offsets given to the kernel are the index of the next entry
        for (index, (ino, kind, name)) in entries.iter().enumerate().skip(offset.max(0) as usize) {
            let buffer_full = reply.add(*ino, index as i64 + 1, *kind, name);
            if buffer_full {
                break;
            }
        }
        reply.ok();
    }

    fn releasedir(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        fh: u64,
        _flags: i32,
        reply: ReplyEmpty,
    ) {
        if self.handles.remove(&fh).is_none() {
            reply.error(libc::EBADF);
            return;
        }
        reply.ok();
    }
}
