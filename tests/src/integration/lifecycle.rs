//! # Document Lifecycle Flows
//!
//! Key, auth-key, context and service lifecycles of a single document,
//! driven in direct mode by the document's own keys.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use did_registry::prelude::*;

    // =========================================================================
    // AUTH KEYS
    // =========================================================================

    #[test]
    fn test_registration_yields_single_auth_key() {
        let mut registry = registry();
        let alice = TestKey::alice();

        let receipt = register(&mut registry, ALICE_DID, &alice);
        assert_eq!(receipt.event_names(), vec!["Register"]);

        let auth = registry.get_all_auth_key(ALICE_DID).unwrap();
        assert_eq!(auth.len(), 1);
        assert_eq!(auth[0].auth_index, 1);
        assert_eq!(auth[0].key, alice.key_data());
        assert_eq!(auth[0].key_type, KeyType::EcdsaSecp256k1Recovery);
    }

    #[test]
    fn test_key_lifecycle_scenario() {
        let mut registry = registry();
        let k1 = TestKey::alice();
        let k2 = TestKey::bob();
        register(&mut registry, ALICE_DID, &k1);

        // K1 is already an auth key.
        assert!(matches!(
            registry.set_auth_key(k1.ctx(), ALICE_DID, k1.key, AuthRequest::Direct),
            Err(RegistryError::AlreadyActive(_))
        ));

        registry
            .add_key(k1.ctx(), ALICE_DID, k2.key, vec![], AuthRequest::Direct)
            .unwrap();
        assert_eq!(registry.get_all_pub_key(ALICE_DID).unwrap().len(), 2);
        assert_eq!(registry.get_all_auth_key(ALICE_DID).unwrap().len(), 1);

        let receipt = registry
            .set_auth_key(k1.ctx(), ALICE_DID, k2.key, AuthRequest::Direct)
            .unwrap();
        assert_eq!(receipt.event_names(), vec!["SetAuthKey"]);
        let auth = registry.get_all_auth_key(ALICE_DID).unwrap();
        assert_eq!(auth.len(), 2);
        assert_eq!(auth[1].auth_index, 2);

        registry
            .deactivate_auth_key(k1.ctx(), ALICE_DID, k1.key, AuthRequest::Direct)
            .unwrap();
        let auth = registry.get_all_auth_key(ALICE_DID).unwrap();
        assert_eq!(auth.len(), 1);
        assert_eq!(auth[0].key, k2.key_data());
        assert_eq!(auth[0].auth_index, 2);

        assert!(matches!(
            registry.deactivate_auth_key(k2.ctx(), ALICE_DID, k2.key, AuthRequest::Direct),
            Err(RegistryError::LastAuthKey(_))
        ));
        // Still fully readable.
        let doc = registry.get_document(ALICE_DID).unwrap();
        assert_eq!(doc.active_auth_keys().len(), 1);
        assert!(!doc.is_deactivated());
    }

    #[test]
    fn test_auth_index_never_reused() {
        let mut registry = registry();
        let k1 = TestKey::alice();
        let k2 = TestKey::bob();
        let k3 = TestKey::carol();
        register(&mut registry, ALICE_DID, &k1);

        registry
            .add_new_auth_key(k1.ctx(), ALICE_DID, k2.key, vec![], AuthRequest::Direct)
            .unwrap();
        registry
            .deactivate_auth_key(k1.ctx(), ALICE_DID, k2.key, AuthRequest::Direct)
            .unwrap();
        let receipt = registry
            .add_new_auth_key(k1.ctx(), ALICE_DID, k3.key, vec![], AuthRequest::Direct)
            .unwrap();

        assert_eq!(
            receipt.events[0].payload,
            EventPayload::AddNewAuthKey {
                key: k3.key_data(),
                controllers: vec![],
                auth_index: 3,
            }
        );
        let indices: Vec<u64> = registry
            .get_all_auth_key(ALICE_DID)
            .unwrap()
            .iter()
            .map(|view| view.auth_index)
            .collect();
        assert_eq!(indices, vec![1, 3]);

        // Re-granting auth to K2 issues a fresh index too.
        registry
            .set_auth_key(k1.ctx(), ALICE_DID, k2.key, AuthRequest::Direct)
            .unwrap();
        let last = registry.get_all_auth_key(ALICE_DID).unwrap();
        assert_eq!(last.last().map(|view| view.auth_index), Some(4));
    }

    #[test]
    fn test_address_variants() {
        let mut registry = registry();
        let owner = TestKey::alice();
        let helper = TestKey::random();
        register(&mut registry, ALICE_DID, &owner);

        let receipt = registry
            .add_addr(
                owner.ctx(),
                ALICE_DID,
                helper.address(),
                vec![did(BOB_DID)],
                AuthRequest::Direct,
            )
            .unwrap();
        assert_eq!(receipt.event_names(), vec!["AddAddr"]);

        let receipt = registry
            .set_auth_addr(owner.ctx(), ALICE_DID, helper.address(), AuthRequest::Direct)
            .unwrap();
        assert_eq!(receipt.event_names(), vec!["SetAuthAddr"]);

        // The helper's address is now an auth key, so it can act directly.
        let receipt = registry
            .deactivate_auth_addr(helper.ctx(), ALICE_DID, helper.address(), AuthRequest::Direct)
            .unwrap();
        assert_eq!(receipt.event_names(), vec!["DeactivateAuthAddr"]);

        let keys = registry.get_all_pub_key(ALICE_DID).unwrap();
        assert_eq!(keys[1].key, KeyData::Address(helper.address()));
        assert_eq!(keys[1].controllers, vec![did(BOB_DID)]);
    }

    #[test]
    fn test_key_and_address_are_the_same_signer() {
        let mut registry = registry();
        let owner = TestKey::alice();
        let k2 = TestKey::bob();
        register(&mut registry, ALICE_DID, &owner);
        registry
            .add_key(owner.ctx(), ALICE_DID, k2.key, vec![], AuthRequest::Direct)
            .unwrap();

        assert!(matches!(
            registry.add_addr(owner.ctx(), ALICE_DID, k2.address(), vec![], AuthRequest::Direct),
            Err(RegistryError::DuplicateKey(_))
        ));
    }

    #[test]
    fn test_deactivate_key_revokes_auth() {
        let mut registry = registry();
        let owner = TestKey::alice();
        let k2 = TestKey::bob();
        register(&mut registry, ALICE_DID, &owner);
        registry
            .add_new_auth_key(owner.ctx(), ALICE_DID, k2.key, vec![], AuthRequest::Direct)
            .unwrap();

        let receipt = registry
            .deactivate_key(owner.ctx(), ALICE_DID, k2.key, AuthRequest::Direct)
            .unwrap();
        assert_eq!(
            receipt.events[0].payload,
            EventPayload::DeactivateKey {
                key: k2.key_data(),
                deactivated_auth_index: Some(2),
            }
        );
        assert_eq!(registry.get_all_pub_key(ALICE_DID).unwrap().len(), 1);
        assert_eq!(registry.get_all_auth_key(ALICE_DID).unwrap().len(), 1);

        // A revoked key cannot act and cannot be re-added.
        assert!(matches!(
            registry.add_context(k2.ctx(), ALICE_DID, vec!["c".into()], AuthRequest::Direct),
            Err(RegistryError::Unauthorized(_))
        ));
        assert!(matches!(
            registry.add_key(owner.ctx(), ALICE_DID, k2.key, vec![], AuthRequest::Direct),
            Err(RegistryError::KeyRevoked(_))
        ));
        assert!(matches!(
            registry.deactivate_key(owner.ctx(), ALICE_DID, k2.key, AuthRequest::Direct),
            Err(RegistryError::AlreadyInactive(_))
        ));
    }

    #[test]
    fn test_default_key_cannot_be_revoked() {
        let mut registry = registry();
        let owner = TestKey::alice();
        register(&mut registry, ALICE_DID, &owner);

        assert!(matches!(
            registry.deactivate_key(owner.ctx(), ALICE_DID, owner.key, AuthRequest::Direct),
            Err(RegistryError::DefaultKey(_))
        ));
    }

    // =========================================================================
    // CONTEXTS AND SERVICES
    // =========================================================================

    #[test]
    fn test_context_union_is_idempotent() {
        let mut registry = registry();
        let owner = TestKey::alice();
        register(&mut registry, ALICE_DID, &owner);

        let receipt = registry
            .add_context(
                owner.ctx(),
                ALICE_DID,
                vec!["c1".into(), "c2".into()],
                AuthRequest::Direct,
            )
            .unwrap();
        assert_eq!(receipt.event_names(), vec!["AddContext", "AddContext"]);
        let len = registry.get_context(ALICE_DID).unwrap().len();

        let receipt = registry
            .add_context(owner.ctx(), ALICE_DID, vec!["c1".into()], AuthRequest::Direct)
            .unwrap();
        assert!(receipt.events.is_empty());
        assert_eq!(registry.get_context(ALICE_DID).unwrap().len(), len);
    }

    #[test]
    fn test_remove_unknown_context_fails() {
        let mut registry = registry();
        let owner = TestKey::alice();
        register(&mut registry, ALICE_DID, &owner);
        registry
            .add_context(owner.ctx(), ALICE_DID, vec!["c1".into()], AuthRequest::Direct)
            .unwrap();

        assert!(matches!(
            registry.remove_context(
                owner.ctx(),
                ALICE_DID,
                vec!["c1".into(), "missing".into()],
                AuthRequest::Direct,
            ),
            Err(RegistryError::UnknownContext(_))
        ));
        // Nothing was removed.
        assert!(registry
            .get_context(ALICE_DID)
            .unwrap()
            .contains(&"c1".to_string()));

        let receipt = registry
            .remove_context(owner.ctx(), ALICE_DID, vec!["c1".into()], AuthRequest::Direct)
            .unwrap();
        assert_eq!(receipt.event_names(), vec!["RemoveContext"]);
    }

    #[test]
    fn test_service_scenario() {
        let mut registry = registry();
        let owner = TestKey::alice();
        register(&mut registry, ALICE_DID, &owner);

        registry
            .add_service(
                owner.ctx(),
                ALICE_DID,
                ServiceEntry::new("s1", "t1", "e1"),
                AuthRequest::Direct,
            )
            .unwrap();
        assert!(matches!(
            registry.add_service(
                owner.ctx(),
                ALICE_DID,
                ServiceEntry::new("s1", "t9", "e9"),
                AuthRequest::Direct,
            ),
            Err(RegistryError::DuplicateServiceId(_))
        ));

        registry
            .update_service(
                owner.ctx(),
                ALICE_DID,
                ServiceEntry::new("s1", "t2", "e2"),
                AuthRequest::Direct,
            )
            .unwrap();
        let services = registry.get_all_service(ALICE_DID).unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].service_type, "t2");
        assert_eq!(services[0].service_endpoint, "e2");

        registry
            .remove_service(owner.ctx(), ALICE_DID, "s1".into(), AuthRequest::Direct)
            .unwrap();
        assert!(registry.get_all_service(ALICE_DID).unwrap().is_empty());

        assert!(matches!(
            registry.update_service(
                owner.ctx(),
                ALICE_DID,
                ServiceEntry::new("s1", "t3", "e3"),
                AuthRequest::Direct,
            ),
            Err(RegistryError::UnknownServiceId(_))
        ));
    }

    // =========================================================================
    // WHOLE DOCUMENT
    // =========================================================================

    #[test]
    fn test_exported_document_round_trips() {
        let mut registry = registry();
        let owner = TestKey::alice();
        let bob = TestKey::bob();
        register(&mut registry, ALICE_DID, &owner);
        register(&mut registry, BOB_DID, &bob);

        registry
            .add_new_auth_key(owner.ctx(), ALICE_DID, bob.key, vec![did(BOB_DID)], AuthRequest::Direct)
            .unwrap();
        registry
            .add_controller(owner.ctx(), ALICE_DID, did(BOB_DID), AuthRequest::Direct)
            .unwrap();
        registry
            .add_context(owner.ctx(), ALICE_DID, vec!["c1".into()], AuthRequest::Direct)
            .unwrap();
        registry
            .add_service(
                owner.ctx(),
                ALICE_DID,
                ServiceEntry::new("hub", "IdentityHub", "https://hub.example.org"),
                AuthRequest::Direct,
            )
            .unwrap();
        registry
            .deactivate_auth_key(owner.ctx(), ALICE_DID, owner.key, AuthRequest::Direct)
            .unwrap();

        let bytes = registry.export_document(ALICE_DID).unwrap();
        let decoded = Document::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, registry.get_document(ALICE_DID).unwrap());

        assert!(matches!(
            Document::from_bytes(&bytes[..bytes.len() - 1]),
            Err(CodecError::DecodeTruncated { .. })
        ));
    }

    #[test]
    fn test_json_rendering() {
        let mut registry = registry();
        let owner = TestKey::alice();
        register(&mut registry, ALICE_DID, &owner);
        registry
            .add_service(
                owner.ctx(),
                ALICE_DID,
                ServiceEntry::new("hub", "IdentityHub", "https://hub.example.org"),
                AuthRequest::Direct,
            )
            .unwrap();

        let json = registry.get_document(ALICE_DID).unwrap().to_json();
        assert_eq!(json["id"], ALICE_DID);
        assert_eq!(
            json["verificationMethod"][0]["type"],
            "EcdsaSecp256k1RecoveryMethod2020"
        );
        assert_eq!(json["authentication"][0], format!("{ALICE_DID}#keys-1"));
        assert_eq!(json["service"][0]["serviceEndpoint"], "https://hub.example.org");
        assert!(json.get("deactivated").is_none());
    }

    #[test]
    fn test_deactivation_is_final() {
        let mut registry = registry();
        let owner = TestKey::alice();
        register(&mut registry, ALICE_DID, &owner);

        let receipt = registry
            .deactivate_id(owner.ctx(), ALICE_DID, AuthRequest::Direct)
            .unwrap();
        assert_eq!(receipt.event_names(), vec!["Deactivate"]);

        assert!(matches!(
            registry.deactivate_id(owner.ctx(), ALICE_DID, AuthRequest::Direct),
            Err(RegistryError::Deactivated(_))
        ));
        assert!(matches!(
            registry.register(owner.ctx(), ALICE_DID, owner.key_data()),
            Err(RegistryError::AlreadyRegistered(_))
        ));
        assert_eq!(registry.get_document(ALICE_DID).unwrap().to_json()["deactivated"], true);
    }

    #[test]
    fn test_registered_dids_enumeration() {
        let mut registry = registry();
        register(&mut registry, ALICE_DID, &TestKey::alice());
        register(&mut registry, BOB_DID, &TestKey::bob());

        let alice = TestKey::alice();
        let address_did = format!("did:example:0x{}", alice.address().to_hex().to_uppercase());
        register(&mut registry, &address_did, &alice);

        let dids = registry.registered_dids().unwrap();
        assert_eq!(dids.len(), 3);
        assert_eq!(dids[0], did(ALICE_DID));
        assert_eq!(
            dids[2].as_str(),
            "did:example:0x4c78c9baff8cf573f1e6dfc11bf3a027934aa818"
        );
    }
}
