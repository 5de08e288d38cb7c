// vfat/src/env.rs

use time::OffsetDateTime;
use vfatfs::{MountEnv, MountOptions};

/// Effective uid/gid of this process: the owner of `/proc/self`.
#[cfg(unix)]
fn process_ids() -> (u32, u32) {
    use std::os::unix::fs::MetadataExt;

    match std::fs::metadata("/proc/self") {
        Ok(meta) => (meta.uid(), meta.gid()),
        Err(e) => {
            log::debug!("cannot stat /proc/self ({e}), defaulting to root ownership");
            (0, 0)
        }
    }
}

#[cfg(not(unix))]
fn process_ids() -> (u32, u32) {
    (0, 0)
}

/// Mount options for this run; explicit ids win over the process ids.
pub fn mount_options(uid: Option<u32>, gid: Option<u32>) -> MountOptions {
    let (proc_uid, proc_gid) = process_ids();
    MountOptions::new(MountEnv {
        uid: uid.unwrap_or(proc_uid),
        gid: gid.unwrap_or(proc_gid),
        mount_time: OffsetDateTime::now_utc(),
        ..MountEnv::default()
    })
}
