//! # Signed-Mode Flows
//!
//! A relayer submits operations signed by an auth key of the target. The
//! signature covers the DID, the delegate and the whole operation, so it
//! cannot be replayed against a different document or operation.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use did_registry::prelude::*;

    fn setup() -> (DidRegistryService<InMemorySlotStore>, TestKey, TestKey) {
        let mut registry = registry();
        let alice = TestKey::alice();
        register(&mut registry, ALICE_DID, &alice);
        (registry, alice, TestKey::random())
    }

    #[test]
    fn test_relayed_operation() {
        let (mut registry, alice, relayer) = setup();
        let k2 = TestKey::bob();
        let op = Operation::AddNewAuthKey {
            key: k2.key_data(),
            controllers: vec![],
        };

        let receipt = registry
            .execute(relayer.ctx(), ALICE_DID, op.clone(), alice.signed(ALICE_DID, &op))
            .unwrap();
        assert_eq!(receipt.authorized_by, Some(alice.address()));
        assert_eq!(registry.get_all_auth_key(ALICE_DID).unwrap().len(), 2);
    }

    #[test]
    fn test_address_signer() {
        let (mut registry, alice, relayer) = setup();
        let op = Operation::AddContext {
            contexts: vec!["c1".into()],
        };
        let digest = op.signing_digest(&did(ALICE_DID), None);
        let request = AuthRequest::signed(alice.address(), alice.sign(&digest));

        registry
            .execute(relayer.ctx(), ALICE_DID, op, request)
            .unwrap();
    }

    #[test]
    fn test_signature_bound_to_operation_and_did() {
        let (mut registry, alice, relayer) = setup();
        let bob = TestKey::bob();
        register(&mut registry, BOB_DID, &bob);
        registry
            .add_new_auth_key(bob.ctx(), BOB_DID, alice.key, vec![], AuthRequest::Direct)
            .unwrap();

        let op = Operation::AddContext {
            contexts: vec!["c1".into()],
        };
        let request = alice.signed(ALICE_DID, &op);

        // Same signature, different operation.
        let other = Operation::AddContext {
            contexts: vec!["c2".into()],
        };
        assert!(matches!(
            registry.execute(relayer.ctx(), ALICE_DID, other, request.clone()),
            Err(RegistryError::InvalidSignature(AuthFailure::SignerMismatch { .. }))
        ));

        // Same signature, different document Alice can also sign for.
        assert!(matches!(
            registry.execute(relayer.ctx(), BOB_DID, op.clone(), request.clone()),
            Err(RegistryError::InvalidSignature(AuthFailure::SignerMismatch { .. }))
        ));

        registry
            .execute(relayer.ctx(), ALICE_DID, op, request)
            .unwrap();
        assert!(registry.get_context(BOB_DID).unwrap().len() == 1);
    }

    #[test]
    fn test_non_auth_signer_is_invalid_signature() {
        let (mut registry, alice, relayer) = setup();
        let k2 = TestKey::bob();
        registry
            .add_key(alice.ctx(), ALICE_DID, k2.key, vec![], AuthRequest::Direct)
            .unwrap();

        // K2 is a public key of the document, but not an auth key.
        let op = Operation::AddContext {
            contexts: vec!["c1".into()],
        };
        assert!(matches!(
            registry.execute(relayer.ctx(), ALICE_DID, op.clone(), k2.signed(ALICE_DID, &op)),
            Err(RegistryError::InvalidSignature(AuthFailure::SignerNotAuthKey { .. }))
        ));
        assert_eq!(registry.get_context(ALICE_DID).unwrap().len(), 1);
        assert_eq!(registry.stats().rejected_authorizations, 1);
    }

    #[test]
    fn test_malformed_signatures() {
        let (mut registry, alice, relayer) = setup();
        let op = Operation::DeactivateId;
        let digest = op.signing_digest(&did(ALICE_DID), None);
        let good = alice.sign(&digest);

        // High-S: n/2 + 1.
        let mut high_s = good;
        high_s.s = [
            0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
            0xFF, 0xFF, 0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46,
            0x68, 0x1B, 0x20, 0xA1,
        ];
        let mut bad_v = good;
        bad_v.v = 5;
        let mut zero_r = good;
        zero_r.r = [0u8; 32];

        for signature in [high_s, bad_v, zero_r] {
            let result = registry.execute(
                relayer.ctx(),
                ALICE_DID,
                op.clone(),
                AuthRequest::signed(alice.key, signature),
            );
            assert!(
                matches!(
                    result,
                    Err(RegistryError::InvalidSignature(AuthFailure::BadSignature(_)))
                ),
                "accepted {signature:?}"
            );
        }
        assert!(!registry.get_document(ALICE_DID).unwrap().is_deactivated());

        registry
            .execute(relayer.ctx(), ALICE_DID, op, AuthRequest::signed(alice.key, good))
            .unwrap();
        assert!(registry.get_document(ALICE_DID).unwrap().is_deactivated());
    }

    #[test]
    fn test_signature_wire_format() {
        let alice = TestKey::alice();
        let signature = alice.sign(&[1u8; 32]);

        let parsed = RecoverableSignature::from_slice(&signature.to_bytes()).unwrap();
        assert_eq!(parsed, signature);
        assert!(parsed.v == 27 || parsed.v == 28);
        assert!(RecoverableSignature::from_slice(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_verify_signature_query() {
        let (registry, alice, relayer) = setup();
        let digest = keccak256(b"arbitrary payload");
        let proof = Proof::Signed(SignedProof {
            signer: alice.key_data(),
            signature: alice.sign(&digest),
        });

        assert!(registry
            .verify_signature(relayer.address(), ALICE_DID, &proof, &digest)
            .unwrap());
        assert!(!registry
            .verify_signature(relayer.address(), ALICE_DID, &proof, &[0u8; 32])
            .unwrap());
        assert!(matches!(
            registry.verify_signature(relayer.address(), "did:example:nobody", &proof, &digest),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_known_key_address() {
        let alice = TestKey::alice();
        assert_eq!(
            alice.address().to_string(),
            "0x4c78c9baff8cf573f1e6dfc11bf3a027934aa818"
        );
        assert_eq!(derive_address(&alice.key), alice.address());
    }
}
