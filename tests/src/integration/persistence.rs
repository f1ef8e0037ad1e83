//! # Persistence Flows
//!
//! Registries over `FileBackedSlotStore`: committed operations survive a
//! reopen, rejected ones leave the file untouched.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use did_registry::prelude::*;
    use std::path::Path;

    fn open(path: &Path) -> DidRegistryService<FileBackedSlotStore> {
        init_tracing();
        DidRegistryService::with_defaults(FileBackedSlotStore::open(path).unwrap())
    }

    #[test]
    fn test_documents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.slots");
        let alice = TestKey::alice();
        let bob = TestKey::bob();

        let snapshot = {
            let mut registry = open(&path);
            register(&mut registry, ALICE_DID, &alice);
            register(&mut registry, BOB_DID, &bob);
            registry
                .add_controller(alice.ctx(), ALICE_DID, did(BOB_DID), AuthRequest::Direct)
                .unwrap();
            registry
                .add_context(
                    alice.ctx(),
                    ALICE_DID,
                    vec!["c1".into(), "c2".into(), "c3".into()],
                    AuthRequest::Direct,
                )
                .unwrap();
            registry
                .remove_context(alice.ctx(), ALICE_DID, vec!["c1".into()], AuthRequest::Direct)
                .unwrap();
            registry.get_document(ALICE_DID).unwrap()
        };

        let registry = open(&path);
        assert_eq!(registry.get_document(ALICE_DID).unwrap(), snapshot);
        assert_eq!(
            registry.registered_dids().unwrap(),
            vec![did(ALICE_DID), did(BOB_DID)]
        );
        assert!(registry
            .verify_controller(bob.address(), ALICE_DID, BOB_DID, &Proof::Direct, &[0u8; 32])
            .unwrap());
    }

    #[test]
    fn test_rejected_operation_leaves_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.slots");
        let alice = TestKey::alice();
        let mallory = TestKey::random();

        let mut registry = open(&path);
        register(&mut registry, ALICE_DID, &alice);
        let before = std::fs::read(&path).unwrap();

        assert!(registry
            .add_context(mallory.ctx(), ALICE_DID, vec!["c".into()], AuthRequest::Direct)
            .is_err());
        assert!(registry
            .deactivate_auth_key(alice.ctx(), ALICE_DID, alice.key, AuthRequest::Direct)
            .is_err());

        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_upgrade_over_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.slots");
        let alice = TestKey::alice();

        {
            let store = SharedSlotStore::new(FileBackedSlotStore::open(&path).unwrap());
            let v1 = DidRegistryService::with_defaults(store.clone());
            let mut proxy = UpgradeProxy::new(store, "v1.0.0", Box::new(v1)).unwrap();
            register(&mut proxy, ALICE_DID, &alice);
        }

        let store = SharedSlotStore::new(FileBackedSlotStore::open(&path).unwrap());
        let config = RegistryConfig::default().with_logic_version(LogicVersion::V2);
        let v2 = DidRegistryService::new(store.clone(), config).unwrap();
        let v1 = DidRegistryService::with_defaults(store.clone());

        // Reopening at the recorded version is accepted, then upgraded.
        let mut proxy = UpgradeProxy::new(store, "v1.0.0", Box::new(v1)).unwrap();
        proxy.upgrade_to("v2.0.0", Box::new(v2)).unwrap();
        assert_eq!(proxy.get_all_auth_key(ALICE_DID).unwrap().len(), 1);
        assert_eq!(proxy.history().unwrap(), vec!["v1.0.0", "v2.0.0"]);
    }
}
