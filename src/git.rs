//! # Git Module
//!
//! Reads the branch, dirty state and upstream drift for the git segment of
//! the status line using gix. Any failure yields `None`, never an error.

use crate::models::git::GitInfo;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Maximum number of commits to walk when calculating ahead/behind
/// This prevents excessive CPU usage on large repositories
const MAX_ANCESTOR_WALK: usize = 10_000;

pub fn read_git_info(start_dir: &Path) -> Option<GitInfo> {
    let repo = match gix::discover(start_dir) {
        Ok(r) => r,
        Err(err) => {
            debug!(dir = %start_dir.display(), error = %err, "not a git repository");
            return None;
        }
    };
    let mut info = GitInfo::default();

    let mut head = repo.head().ok()?;
    if let Some(name) = head.referent_name() {
        info.branch = Some(name.shorten().to_string());
    }
    let head_id = head.try_peel_to_id_in_place().ok().flatten();
    if let Some(id) = head_id.as_ref() {
        let hex = id.to_hex().to_string();
        info.short_commit = Some(hex.chars().take(7).collect());
    }

    // Index vs worktree; untracked files do not count
    info.is_clean = repo.is_dirty().ok().map(|dirty| !dirty);

    if let (Some(branch), Some(head_id)) = (info.branch.clone(), head_id) {
        let cfg = repo.config_snapshot();
        let key_remote = format!("branch.{branch}.remote");
        let key_merge = format!("branch.{branch}.merge");
        if let (Some(remote), Some(merge_ref)) = (
            cfg.string(key_remote.as_str()),
            cfg.string(key_merge.as_str()),
        ) {
            let merge_s = merge_ref.to_string();
            let merge_short = merge_s
                .strip_prefix("refs/heads/")
                .unwrap_or(merge_s.as_str());
            let upstream_ref = format!("refs/remotes/{remote}/{merge_short}");
            if let Ok(mut up_ref) = repo.find_reference(upstream_ref.as_str()) {
                if let Ok(up_id) = up_ref.peel_to_id_in_place() {
                    let head_set = ancestor_set(head_id);
                    let up_set = ancestor_set(up_id);
                    info.ahead = Some(head_set.difference(&up_set).count());
                    info.behind = Some(up_set.difference(&head_set).count());
                }
            }
        }
    }
    Some(info)
}

fn ancestor_set(id: gix::Id<'_>) -> HashSet<String> {
    let mut set = HashSet::new();
    if let Ok(iter) = id.ancestors().all() {
        for item in iter.flatten() {
            set.insert(item.id.to_string());
            if set.len() >= MAX_ANCESTOR_WALK {
                break;
            }
        }
    }
    set
}
