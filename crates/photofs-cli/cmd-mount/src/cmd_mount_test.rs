// Copyright (c) Contributors to the PhotoFS project.
// SPDX-License-Identifier: Apache-2.0

use fuser::MountOption;
use nix::unistd::{Gid, Uid};
use rstest::rstest;

use super::{MountSettings, parse_options_from_args};

fn settings(args: &[&str], uid: u32) -> anyhow::Result<MountSettings> {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    MountSettings::new(
        parse_options_from_args(&args),
        Uid::from_raw(uid),
        Gid::from_raw(uid),
        10,
    )
}

#[rstest]
fn test_parse_options() {
    let args = vec![
        String::from("allow_other"),
        String::from("fsname=photos"),
        String::from("uid=10"),
    ];
    assert_eq!(
        parse_options_from_args(&args),
        vec![
            MountOption::AllowOther,
            MountOption::FSName("photos".into()),
            MountOption::CUSTOM("uid=10".into()),
        ]
    );
}

#[rstest]
fn test_required_options_are_kept() {
    let settings = settings(&["allow_other", "nodev", "recent=3"], 1000).unwrap();
    assert_eq!(settings.recent_tags, 3);
    assert_eq!(
        settings.mount_options,
        vec![
            MountOption::NoDev,
            MountOption::NoSuid,
            MountOption::FSName("photofs".into()),
            MountOption::Subtype("photofs".into()),
            MountOption::AllowOther,
        ]
    );
}

#[rstest]
#[case(&["uid=10"])]
#[case(&["gid=10"])]
#[case(&["dev"])]
#[case(&["fsname=other"])]
#[case(&["recent=many"])]
#[case(&["remote=origin"])]
fn test_rejected_options(#[case] args: &[&str]) {
    assert!(settings(args, 1000).is_err(), "{args:?} should be rejected");
}

#[rstest]
fn test_root_may_change_owner() {
    let settings = settings(&["uid=10", "gid=20"], 0).unwrap();
    assert_eq!(settings.uid, Uid::from_raw(10));
    assert_eq!(settings.gid, Gid::from_raw(20));
}
