//! # Logic Upgrade Flows
//!
//! Two logic versions over one shared store: everything written by V1 is
//! served by V2, and V2's version counter lives in its own namespace.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use did_registry::prelude::*;

    type Shared = SharedSlotStore<InMemorySlotStore>;

    fn logic(store: &Shared, version: LogicVersion) -> DidRegistryService<Shared> {
        init_tracing();
        let config = RegistryConfig::default().with_logic_version(version);
        DidRegistryService::new(store.clone(), config).unwrap()
    }

    fn proxy(store: &Shared) -> UpgradeProxy<Shared> {
        UpgradeProxy::new(
            store.clone(),
            LogicVersion::V1.tag(),
            Box::new(logic(store, LogicVersion::V1)),
        )
        .unwrap()
    }

    #[test]
    fn test_upgrade_preserves_documents() {
        let store = Shared::new(InMemorySlotStore::new());
        let mut proxy = proxy(&store);
        let alice = TestKey::alice();
        let k2 = TestKey::bob();

        register(&mut proxy, ALICE_DID, &alice);
        proxy
            .add_new_auth_key(alice.ctx(), ALICE_DID, k2.key, vec![], AuthRequest::Direct)
            .unwrap();
        proxy
            .add_service(
                alice.ctx(),
                ALICE_DID,
                ServiceEntry::new("s1", "t1", "e1"),
                AuthRequest::Direct,
            )
            .unwrap();
        let before = proxy.get_document(ALICE_DID).unwrap();
        assert_eq!(
            proxy.get_document_metadata(ALICE_DID).unwrap().version_id,
            None
        );

        proxy
            .upgrade_to(
                LogicVersion::V2.tag(),
                Box::new(logic(&store, LogicVersion::V2)),
            )
            .unwrap();
        assert_eq!(proxy.version(), "v2.0.0");
        assert_eq!(proxy.get_document(ALICE_DID).unwrap(), before);

        let metadata = proxy.get_document_metadata(ALICE_DID).unwrap();
        assert_eq!(metadata.logic_version, LogicVersion::V2);
        assert_eq!(metadata.version_id, Some(0));

        // Auth index bookkeeping carries across the upgrade.
        let k3 = TestKey::carol();
        let receipt = proxy
            .add_new_auth_key(k2.ctx(), ALICE_DID, k3.key, vec![], AuthRequest::Direct)
            .unwrap();
        assert!(matches!(
            receipt.events[0].payload,
            EventPayload::AddNewAuthKey { auth_index: 3, .. }
        ));
        assert_eq!(
            proxy.get_document_metadata(ALICE_DID).unwrap().version_id,
            Some(1)
        );
        assert_eq!(proxy.history().unwrap(), vec!["v1.0.0", "v2.0.0"]);
    }

    #[test]
    fn test_two_logics_share_one_store() {
        let store = Shared::new(InMemorySlotStore::new());
        let mut v1 = logic(&store, LogicVersion::V1);
        let mut v2 = logic(&store, LogicVersion::V2);
        let alice = TestKey::alice();
        let bob = TestKey::bob();

        register(&mut v1, ALICE_DID, &alice);
        register(&mut v2, BOB_DID, &bob);

        assert_eq!(v1.registered_dids().unwrap(), v2.registered_dids().unwrap());
        assert_eq!(v1.get_document(BOB_DID).unwrap(), v2.get_document(BOB_DID).unwrap());

        v2.add_context(alice.ctx(), ALICE_DID, vec!["c1".into()], AuthRequest::Direct)
            .unwrap();
        assert_eq!(v1.get_context(ALICE_DID).unwrap().len(), 2);

        // V1 ignores the counter that V2 maintains.
        assert_eq!(v1.get_document_metadata(ALICE_DID).unwrap().version_id, None);
        assert_eq!(v2.get_document_metadata(ALICE_DID).unwrap().version_id, Some(1));
        assert_eq!(v2.get_document_metadata(BOB_DID).unwrap().version_id, Some(1));
    }

    #[test]
    fn test_rejected_upgrades_keep_current_logic() {
        let store = Shared::new(InMemorySlotStore::new());
        let mut proxy = proxy(&store);

        for tag in ["", "v1.0.0"] {
            assert!(matches!(
                proxy.upgrade_to(tag, Box::new(logic(&store, LogicVersion::V2))),
                Err(RegistryError::Upgrade(_))
            ));
        }
        assert_eq!(proxy.version(), "v1.0.0");
        assert_eq!(proxy.logic_version(), LogicVersion::V1);

        proxy
            .upgrade_to("v2.0.0", Box::new(logic(&store, LogicVersion::V2)))
            .unwrap();
        // No rollback to an installed tag.
        assert!(matches!(
            proxy.upgrade_to("v1.0.0", Box::new(logic(&store, LogicVersion::V1))),
            Err(RegistryError::Upgrade(_))
        ));
    }
}
