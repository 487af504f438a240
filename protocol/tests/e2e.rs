//! End-to-end integration tests for the transaction core.
//!
//! These tests drive the public API the way a wallet does: derive keys from
//! a secret phrase, build a transaction, sign it, serialize it for a node,
//! and read node output back. Fixed vectors pin the byte recipes that must
//! match the network exactly: public key derivation, signatures,
//! Reed-Solomon addresses and the signature-folded transaction id.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use nxt_protocol::config::{ChainParams, ONE_NXT, TRANSACTION_HEADER_LENGTH};
use nxt_protocol::crypto::{self, reed_solomon, EncryptedPayload, KeyPair, PublicKey};
use nxt_protocol::numeric::{safe_add, safe_multiply, safe_negate, to_hex};
use nxt_protocol::transaction::attachment::{AssetTransfer, GoodsDelivery};
use nxt_protocol::transaction::{
    verify_transaction, Attachment, EncryptToSelfMessage, EncryptedMessage, Message, Transaction,
    TransactionBuilder, TransactionError, TransactionType,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const PHRASE: &str = "nxt transaction core test phrase";
const PUBLIC_KEY_HEX: &str = "f66f93b7bf462733bee0a96ce9c6a8bc9b980fcb7e88e659c7fff5e994721c43";

fn alice() -> KeyPair {
    KeyPair::from_secret_phrase(PHRASE).unwrap()
}

fn bob() -> KeyPair {
    KeyPair::from_secret_phrase("bob's much longer and unrelated phrase").unwrap()
}

/// The payment whose id and signature are pinned below.
fn vector_payment() -> Transaction {
    TransactionBuilder::new(TransactionType::OrdinaryPayment)
        .sender_public_key(alice().public_key())
        .recipient(12345)
        .amount(100_000_000)
        .fee(100_000_000)
        .timestamp(0)
        .deadline(1440)
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Key and address vectors
// ---------------------------------------------------------------------------

#[test]
fn secret_phrase_derives_known_account() {
    let keys = alice();
    assert_eq!(
        to_hex(keys.private_key().as_bytes()),
        "58c7b618e707dd8599390180e9dbd6b199f804edd02e6327e9793704d8eccf66"
    );
    assert_eq!(keys.public_key().to_hex(), PUBLIC_KEY_HEX);
    assert_eq!(keys.account_id(), 6_834_292_491_371_909_655);
    assert_eq!(keys.rs_address(), "NXT-H6JR-TYRP-VJJ5-7A4QX");
}

#[test]
fn reed_solomon_vectors_and_corruption() {
    assert_eq!(reed_solomon::encode(1_739_068_987_193_023_818), "MRCC-2YLS-8M54-3CMAJ");
    assert_eq!(reed_solomon::decode("MRCC-2YLS-8M54-3CMAJ").unwrap(), 1_739_068_987_193_023_818);
    assert_eq!(reed_solomon::encode(0), "2222-2222-2222-22222");
    assert_eq!(reed_solomon::encode(u64::MAX), "ZZZZ-ZZZZ-QY2K-HZZZZ");
    assert!(reed_solomon::decode("MRCC-2YLS-8M54-3CMAK").is_err());
    assert_eq!(
        crypto::parse_account_id("NXT-2E3T-2222-2YW9-22222").unwrap(),
        crypto::parse_account_id("12345").unwrap()
    );
}

#[test]
fn signature_vector() {
    let signature = alice().sign(b"hello nxt").unwrap();
    assert_eq!(
        signature.to_hex(),
        "0a730e79c912970eb497093f798692b532d9ae2f4518791107e80efe7c45a602\
         4ccf33ba38618fc1073659ba076fbc47355245fc602c32770f283e823f5fc725"
    );
    assert!(alice().public_key().verify(b"hello nxt", &signature, true));
    assert!(!alice().public_key().verify(b"hello nxT", &signature, true));
}

// ---------------------------------------------------------------------------
// Payment lifecycle
// ---------------------------------------------------------------------------

#[test]
fn payment_wire_layout() {
    let tx = vector_payment();
    let bytes = tx.bytes();
    assert_eq!(bytes.len(), 176);
    assert_eq!(bytes[0], 0x00);
    assert_eq!(bytes[1], 0x10);
    assert_eq!(&bytes[8..40], alice().public_key().as_bytes());
    assert_eq!(&bytes[40..48], &12345u64.to_le_bytes());
    // flags, ec block height and id are all zero
    assert!(bytes[TRANSACTION_HEADER_LENGTH..].iter().all(|&b| b == 0));
}

#[test]
fn payment_signature_and_identity_vector() {
    let keys = alice();
    let mut tx = vector_payment();
    tx.sign(keys.private_key()).unwrap();

    assert_eq!(
        tx.signature().unwrap().to_hex(),
        "2d5299541612f55d0dceb59995818c6b40132fc99747b7dbd4cacbfe56f4a90d\
         233b772fc3de0933c0a981fd84769ae9b2fc2cecb0b834d322426df80e04e933"
    );
    assert_eq!(
        tx.full_hash_hex().unwrap(),
        "2840040535e17fe15db6d64403ee649df6e822116c4b9545e667bf0a8db4d404"
    );
    assert_eq!(tx.id().unwrap(), 16_248_953_598_409_719_848);
    assert_eq!(tx.string_id().unwrap(), "16248953598409719848");
    verify_transaction(&tx).unwrap();
}

#[test]
fn minimal_sender_key_scenario_round_trips() {
    let mut key = [0u8; 32];
    key[31] = 1;
    let tx = TransactionBuilder::new(TransactionType::OrdinaryPayment)
        .sender_public_key(PublicKey::from_bytes(key))
        .recipient(12345)
        .amount(100_000_000)
        .fee(100_000_000)
        .timestamp(0)
        .deadline(1440)
        .version(1)
        .build()
        .unwrap();

    let bytes = tx.bytes();
    assert_eq!(bytes[0], 0x00);
    assert_eq!(bytes[1], 0x10);

    let parsed = Transaction::from_bytes(&bytes).unwrap();
    assert_eq!(parsed, tx);
    assert_eq!(parsed.sender_public_key(), &PublicKey::from_bytes(key));
    assert_eq!(parsed.recipient_id(), Some(12345));
    assert_eq!(parsed.amount_nqt(), 100_000_000);
    assert_eq!(parsed.fee_nqt(), 100_000_000);
    assert_eq!(parsed.timestamp(), 0);
    assert_eq!(parsed.deadline(), 1440);
    assert_eq!(parsed.version(), 1);
    assert_eq!(parsed.bytes(), bytes);
}

#[test]
fn signed_payment_survives_bytes_and_json() {
    let keys = alice();
    let mut tx = vector_payment();
    tx.sign(keys.private_key()).unwrap();

    let from_bytes = Transaction::from_bytes(&tx.bytes()).unwrap();
    assert_eq!(from_bytes, tx);
    assert_eq!(from_bytes.id().unwrap(), tx.id().unwrap());

    let text = serde_json::to_string(&tx).unwrap();
    let from_json: Transaction = serde_json::from_str(&text).unwrap();
    assert_eq!(from_json, tx);
    assert!(from_json.verify_signature());
}

#[test]
fn tampered_bytes_fail_verification() {
    let keys = alice();
    let mut tx = vector_payment();
    tx.sign(keys.private_key()).unwrap();

    let mut bytes = tx.bytes();
    // amount field
    bytes[48] ^= 0x01;
    let tampered = Transaction::from_bytes(&bytes).unwrap();
    assert!(matches!(
        verify_transaction(&tampered),
        Err(TransactionError::InvalidSignature)
    ));
    assert_ne!(tampered.id().unwrap(), tx.id().unwrap());
}

// ---------------------------------------------------------------------------
// Node JSON
// ---------------------------------------------------------------------------

#[test]
fn node_json_with_quoted_numbers_parses() {
    let keys = alice();
    let node_output = json!({
        "type": 0,
        "subtype": 0,
        "timestamp": 0,
        "deadline": 1440,
        "senderPublicKey": PUBLIC_KEY_HEX,
        "recipient": "12345",
        "amountNQT": "100000000",
        "feeNQT": "100000000",
        "version": 1,
        "ecBlockHeight": 0,
        "ecBlockId": "0",
        "height": 2147483647u32,
        "confirmations": 0,
    });
    let tx = Transaction::from_json(node_output, &ChainParams::default()).unwrap();
    assert_eq!(tx.sender_id(), keys.account_id());
    assert_eq!(tx.bytes(), vector_payment().bytes());
    assert_eq!(tx.height(), Some(i32::MAX as u32));
}

#[test]
fn asset_transfer_json_uses_unsigned_ids() {
    let keys = alice();
    let tx = TransactionBuilder::new(TransactionType::AssetTransfer)
        .sender_public_key(keys.public_key())
        .recipient(u64::MAX)
        .attachment(Attachment::AssetTransfer(AssetTransfer {
            asset_id: 1 << 63,
            quantity_qnt: 50,
            comment: String::new(),
        }))
        .timestamp(10)
        .build()
        .unwrap();
    let value = tx.to_json().unwrap();
    assert_eq!(value["recipient"], json!("18446744073709551615"));
    assert_eq!(value["attachment"]["asset"], json!("9223372036854775808"));
    assert_eq!(value["attachment"]["version.AssetTransfer"], json!(1));
    assert!(value["attachment"].get("comment").is_none());

    let parsed = Transaction::from_json(value, &ChainParams::default()).unwrap();
    assert_eq!(parsed, tx);
}

#[test]
fn unknown_type_in_json_is_rejected() {
    let err = Transaction::from_json_str(
        r#"{"type":7,"subtype":0,"timestamp":0,"deadline":1,"senderPublicKey":"00","amountNQT":0,"feeNQT":0}"#,
        &ChainParams::default(),
    )
    .unwrap_err();
    assert!(matches!(err, TransactionError::UnknownType { type_code: 7, subtype: 0 }));
}

// ---------------------------------------------------------------------------
// Encrypted messages
// ---------------------------------------------------------------------------

#[test]
fn encrypted_hi_round_trips_between_two_keys() {
    let mut rng = StdRng::seed_from_u64(7);
    let (alice, bob) = (alice(), bob());

    let first = EncryptedPayload::encrypt(b"hi", false, alice.private_key(), &bob.public_key(), &mut rng).unwrap();
    let second = EncryptedPayload::encrypt(b"hi", false, alice.private_key(), &bob.public_key(), &mut rng).unwrap();
    assert_ne!(first.data(), second.data());
    assert_ne!(first.nonce(), second.nonce());

    for payload in [&first, &second] {
        assert_eq!(payload.decrypt(false, bob.private_key(), &alice.public_key()).unwrap(), b"hi");
        assert_eq!(payload.decrypt(false, alice.private_key(), &bob.public_key()).unwrap(), b"hi");
    }
}

#[test]
fn payment_with_every_appendage() {
    let mut rng = StdRng::seed_from_u64(11);
    let (alice, bob) = (alice(), bob());
    let note = "meet at noon, bring the ledger";

    let to_bob = EncryptedPayload::encrypt(note.as_bytes(), true, alice.private_key(), &bob.public_key(), &mut rng).unwrap();
    let to_self = EncryptedPayload::encrypt(b"paid bob", true, alice.private_key(), &alice.public_key(), &mut rng).unwrap();

    let mut tx = TransactionBuilder::new(TransactionType::OrdinaryPayment)
        .sender_public_key(alice.public_key())
        .recipient(bob.account_id())
        .amount(3 * ONE_NXT)
        .timestamp(1_000)
        .message(Message::text("invoice 42"))
        .encrypted_message(EncryptedMessage::new(to_bob, true))
        .public_key_announcement(nxt_protocol::transaction::PublicKeyAnnouncement::new(bob.public_key()))
        .encrypt_to_self_message(EncryptToSelfMessage::new(to_self, true))
        .build()
        .unwrap();
    tx.sign(alice.private_key()).unwrap();
    assert_eq!(tx.flags(), 0b1111);

    let parsed = Transaction::from_bytes(&tx.bytes()).unwrap();
    assert_eq!(parsed, tx);
    verify_transaction(&parsed).unwrap();

    let received = parsed.encrypted_message().unwrap();
    let plaintext = received
        .payload()
        .decrypt(true, bob.private_key(), parsed.sender_public_key())
        .unwrap();
    assert_eq!(plaintext, note.as_bytes());
    assert_eq!(parsed.message().unwrap().as_text(), Some("invoice 42"));

    let own = parsed
        .encrypt_to_self_message()
        .unwrap()
        .payload()
        .decrypt(true, alice.private_key(), &alice.public_key())
        .unwrap();
    assert_eq!(own, b"paid bob");

    let json = tx.to_json().unwrap();
    let from_json = Transaction::from_json(json, &ChainParams::default()).unwrap();
    assert_eq!(from_json, tx);
}

#[test]
fn digital_goods_delivery_carries_encrypted_goods() {
    let mut rng = StdRng::seed_from_u64(3);
    let (seller, buyer) = (alice(), bob());
    let goods = EncryptedPayload::encrypt(b"license key ABCD", false, seller.private_key(), &buyer.public_key(), &mut rng).unwrap();

    let tx = TransactionBuilder::new(TransactionType::DigitalGoodsDelivery)
        .sender_public_key(seller.public_key())
        .recipient(buyer.account_id())
        .attachment(Attachment::DigitalGoodsDelivery(GoodsDelivery {
            purchase_id: 77,
            goods,
            goods_is_text: true,
            discount_nqt: 0,
        }))
        .timestamp(5)
        .build()
        .unwrap();

    let parsed = Transaction::from_bytes(&tx.bytes()).unwrap();
    let Attachment::DigitalGoodsDelivery(delivery) = parsed.attachment() else {
        panic!("wrong attachment {:?}", parsed.attachment());
    };
    let plaintext = delivery
        .goods
        .decrypt(false, buyer.private_key(), &seller.public_key())
        .unwrap();
    assert_eq!(plaintext, b"license key ABCD");
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[test]
fn fee_floor_and_substitution() {
    let base = || {
        TransactionBuilder::new(TransactionType::OrdinaryPayment)
            .sender_public_key(alice().public_key())
            .recipient(1)
            .amount(1)
    };
    assert_eq!(base().fee(0).build().unwrap().fee_nqt(), ONE_NXT);
    assert!(matches!(
        base().fee(ONE_NXT / 2).build(),
        Err(TransactionError::FeeBelowMinimum { .. })
    ));
}

#[test]
fn recipient_invariant_for_recipientless_types() {
    let build = |recipient: u64, amount: i64| {
        TransactionBuilder::new(TransactionType::DigitalGoodsDelisting)
            .sender_public_key(alice().public_key())
            .attachment(Attachment::DigitalGoodsDelisting(
                nxt_protocol::transaction::attachment::GoodsDelisting { goods_id: 1 },
            ))
            .recipient(recipient)
            .amount(amount)
            .build()
    };
    assert!(build(0, 0).is_ok());
    assert!(matches!(build(5, 0), Err(TransactionError::UnexpectedRecipient { .. })));
    assert!(matches!(build(0, 5), Err(TransactionError::UnexpectedAmount { .. })));
}

#[test]
fn overflow_is_detected() {
    assert!(safe_add(i64::MAX, 1).is_err());
    assert!(safe_multiply(i64::MAX, 2).is_err());
    assert!(safe_negate(i64::MIN).is_err());
}
