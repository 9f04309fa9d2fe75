// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn explicit_dir_wins() {
    let config = Config::resolve(Some(PathBuf::from("/srv/pcron"))).unwrap();
    assert_eq!(config.dir, PathBuf::from("/srv/pcron"));
    assert_eq!(config.crontab_path(), PathBuf::from("/srv/pcron/crontab.ini"));
    assert_eq!(config.pid_path(), PathBuf::from("/srv/pcron/pcron.pid"));
    assert_eq!(config.state_path(), PathBuf::from("/srv/pcron/state.json"));
    assert_eq!(config.jobs_dir(), PathBuf::from("/srv/pcron/jobs"));
}
