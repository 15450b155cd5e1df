use std::fs;
use std::path::PathBuf;

use labx_map::{
    ComponentMapEntry, CustomerProfile, FieldMapEntry, ProfileRepository, StoredProfile,
};
use labx_model::{CustomerId, ExportPolicy, RecordKind};

fn temp_repo_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("labx_profile_repo_{}_{stamp}", std::process::id()));
    dir
}

fn cleanup_dir(dir: &PathBuf) {
    let _ = fs::remove_dir_all(dir);
}

fn sample_profile(customer: &str) -> CustomerProfile {
    CustomerProfile::new(CustomerId::new(customer).unwrap())
        .with_policy(ExportPolicy::FtpReq)
        .with_test_nodes(true)
        .with_field(FieldMapEntry::new(RecordKind::Sample, "ID_NUMERIC", "SampleId"))
        .with_field(FieldMapEntry::new(RecordKind::Result, "TEXT", "Value"))
        .with_component(
            ComponentMapEntry::new("PH", "PH", "PH_TEST", "PH", 1).with_value("NEUTRAL", "7"),
        )
        .with_component_list("PH_TEST", "ACME_PH")
}

#[test]
fn repository_save_and_load() {
    let dir = temp_repo_dir();
    let repo = ProfileRepository::new(&dir).expect("create repo");

    let profile = sample_profile("acme");
    let path = repo.save(&profile).expect("save profile");
    assert!(path.exists());
    assert!(path.to_string_lossy().ends_with("ACME.json"));

    let loaded = repo
        .load(&CustomerId::new("ACME").unwrap())
        .expect("load profile")
        .expect("profile should exist");
    assert_eq!(loaded, profile);

    cleanup_dir(&dir);
}

#[test]
fn repository_load_nonexistent() {
    let dir = temp_repo_dir();
    let repo = ProfileRepository::new(&dir).expect("create repo");

    let loaded = repo
        .load(&CustomerId::new("NOBODY").unwrap())
        .expect("load attempt");
    assert!(loaded.is_none());

    cleanup_dir(&dir);
}

#[test]
fn repository_rejects_invalid_profile() {
    let dir = temp_repo_dir();
    let repo = ProfileRepository::new(&dir).expect("create repo");

    let profile = sample_profile("ACME").with_field(FieldMapEntry::new(
        RecordKind::Sample,
        "CUSTOMER_ID",
        "Customer",
    ));
    assert!(repo.save(&profile).is_err());
    assert!(!repo.exists(&profile.customer_id));

    cleanup_dir(&dir);
}

#[test]
fn repository_rejects_node_name_with_spaces() {
    let dir = temp_repo_dir();
    let repo = ProfileRepository::new(&dir).expect("create repo");

    let profile = sample_profile("ACME").with_field(FieldMapEntry::new(
        RecordKind::Result,
        "UNITS",
        "Result Units",
    ));
    let err = repo.save(&profile).unwrap_err();
    assert!(format!("{err:#}").contains("Result Units"));
    assert!(!repo.exists(&profile.customer_id));

    cleanup_dir(&dir);
}

#[test]
fn repository_load_all_skips_unreadable_files() {
    let dir = temp_repo_dir();
    let repo = ProfileRepository::new(&dir).expect("create repo");

    repo.save(&sample_profile("ACME")).unwrap();
    repo.save_stored(&StoredProfile::new(sample_profile("GLOBEX")).with_description("pilot"))
        .unwrap();
    fs::write(dir.join("BROKEN.json"), "{ not json").unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let catalog = repo.load_all().expect("load all");
    assert_eq!(catalog.len(), 2);
    assert!(catalog.get(&CustomerId::new("GLOBEX").unwrap()).is_some());

    let listed = repo.list().expect("list");
    let customers: Vec<&str> = listed.iter().map(|m| m.customer_id.as_str()).collect();
    assert_eq!(customers, vec!["ACME", "GLOBEX"]);
    assert_eq!(listed[0].export_policy, "FTPREQ");
    assert_eq!(listed[0].component_count, 1);

    cleanup_dir(&dir);
}

#[test]
fn repository_delete() {
    let dir = temp_repo_dir();
    let repo = ProfileRepository::new(&dir).expect("create repo");
    let profile = sample_profile("ACME");
    repo.save(&profile).unwrap();

    assert!(repo.delete(&profile.customer_id).unwrap());
    assert!(!repo.delete(&profile.customer_id).unwrap());
    assert!(!repo.exists(&profile.customer_id));

    cleanup_dir(&dir);
}
