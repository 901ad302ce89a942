//! End-to-end checks of a mining job: configure a builder once, then build
//! coinbases for successive extra-nonce2 values.

use coinbase_core::{
    double_sha256, sha256, sha256_resume, BuiltCoinbase, CoinbaseBuilder, CoinbaseError,
    Transaction, TransactionOutput,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pool output paying 0 satoshis to a 25-byte P2PKH script.
fn pool_output() -> TransactionOutput {
    let script = hex::decode("76a914000102030405060708090a0b0c0d0e0f1011121388ac").unwrap();
    assert_eq!(script.len(), 25);
    TransactionOutput::new(0, script)
}

fn job() -> CoinbaseBuilder {
    CoinbaseBuilder::new(
        500_000,
        vec![0x01, 0x02],
        vec![0x03],
        4,
        4,
        vec![pool_output()],
        0,
    )
    .unwrap()
}

#[test]
fn test_job_serialization_round_trips_through_hex() {
    init_logging();
    let builder = job();

    let built = builder
        .build(&[0xde, 0xad, 0xbe, 0xef], &[0x00, 0x00, 0x00, 0x01], true)
        .unwrap();
    let raw_hex = built.transaction().to_hex();

    let expected = concat!(
        "01000000",                                                          // version
        "01",                                                                // input count
        "0000000000000000000000000000000000000000000000000000000000000000", // null txid
        "ffffffff",                                                          // null vout
        "11",                                                                // script length
        "0320a107",                                                          // height 500000
        "0102",                                                              // prefix
        "08deadbeef00000001",                                                // enonce push
        "03",                                                                // postfix
        "00",                                                                // padding
        "ffffffff",                                                          // sequence
        "01",                                                                // output count
        "0000000000000000",                                                  // value
        "1976a914000102030405060708090a0b0c0d0e0f1011121388ac",              // script
        "00000000",                                                          // lock-time
    );
    assert_eq!(raw_hex, expected);

    let decoded = Transaction::from_hex(&raw_hex).unwrap();
    assert_eq!(&decoded, built.transaction());
    assert_eq!(decoded.to_hex(), raw_hex);
    assert_eq!(hex::encode(hex::decode(&raw_hex).unwrap()), raw_hex);

    let client = built.client_serialize().unwrap();
    assert_eq!(client.len() % 64, 0);
    assert_eq!(hex::encode(&client), &expected[..128]);
}

#[test]
fn test_every_enonce2_stays_aligned() {
    init_logging();
    let builder = CoinbaseBuilder::new(
        840_000,
        b"/solo/".to_vec(),
        vec![],
        4,
        8,
        vec![
            TransactionOutput::new(
                312_500_000,
                hex::decode("0014aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap(),
            ),
            pool_output(),
        ],
        0,
    )
    .unwrap();

    let enonce1 = [0x11, 0x22, 0x33, 0x44];
    let mut full_len = None;
    for counter in 0u64..32 {
        let built = builder.build(&enonce1, &counter.to_be_bytes(), true).unwrap();
        let cb = built.as_bitshare().unwrap();

        assert_eq!(cb.client_serialize().len() * 8 % 512, 0);
        assert_eq!(
            cb.client_serialize().len(),
            cb.serialize().len() - cb.trailing_output_len() - 4
        );
        assert_eq!(*full_len.get_or_insert(cb.serialize().len()), cb.serialize().len());

        // A hasher holding the midstate and the tail reproduces the txid.
        let midstate = cb.client_midstate().unwrap();
        let first = sha256_resume(&midstate, &cb.client_tail());
        assert_eq!(first, sha256(&cb.serialize()));
        assert_eq!(sha256(&first), double_sha256(&cb.serialize()));
        assert_eq!(sha256(&first), built.transaction().txid());
    }
}

#[test]
fn test_wrong_nonce_lengths_produce_nothing() {
    init_logging();
    let builder = job();

    for (e1, e2) in [(&[0u8; 3][..], &[0u8; 4][..]), (&[0u8; 4][..], &[0u8; 8][..])] {
        for bitshare in [true, false] {
            assert!(matches!(
                builder.build(e1, e2, bitshare),
                Err(CoinbaseError::LengthMismatch { .. })
            ));
        }
    }
}

#[test]
fn test_plain_coinbase_is_not_truncatable() {
    init_logging();
    let builder = job();

    let plain = builder.build(&[1; 4], &[2; 4], false).unwrap();
    assert!(matches!(plain, BuiltCoinbase::Plain(_)));
    assert!(plain.client_serialize().is_none());

    let tx = plain.into_transaction();
    assert!(tx.is_coinbase());
    // height push + prefix + enonce push + postfix, no padding
    assert_eq!(tx.inputs[0].script_sig.len(), 4 + 2 + 9 + 1);
}
