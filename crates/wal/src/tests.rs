use super::*;
use codec::{record_checksum, Key, Value};
use std::fs;
use std::io::Cursor;
use tempfile::tempdir;

// -------------------- Helpers --------------------

fn key(i: u16) -> Key {
    Key::new(1, 100, i, i.wrapping_mul(3))
}

fn encoded(key: Key, value: u64) -> [u8; RECORD_BYTES] {
    let mut out = [0u8; RECORD_BYTES];
    out.copy_from_slice(&WalRecord::new(key, Value(value)).encode());
    out
}

fn replay_all(path: &std::path::Path) -> Result<Vec<WalRecord>, WalError> {
    WalReader::open(path)?.read_all()
}

fn replay_from_bytes(data: &[u8]) -> Result<(Vec<WalRecord>, u64), WalError> {
    let mut reader = WalReader::from_reader(Cursor::new(data.to_vec()));
    let mut recs = Vec::new();
    let valid = reader.replay(|r| recs.push(r))?;
    Ok((recs, valid))
}

// -------------------- Record format --------------------

#[test]
fn record_layout() {
    let k = Key::new(1, 100, 12, 34);
    let bytes = encoded(k, 9999);

    assert_eq!(bytes.len(), 32);
    assert_eq!(&bytes[0..4], &0xDEAD_BEEFu32.to_le_bytes());
    assert_eq!(&bytes[4..6], &1u16.to_le_bytes());
    assert_eq!(&bytes[6..8], &[0, 0]);
    assert_eq!(&bytes[8..16], &record_checksum(&k, Value(9999)).to_le_bytes());
    assert_eq!(&bytes[16..24], &k.to_bytes());
    assert_eq!(&bytes[24..32], &9999u64.to_le_bytes());
}

#[test]
fn record_roundtrip_and_checksum() {
    let rec = WalRecord::new(Key::new(7, 8, 9, 10), Value(u64::MAX));
    let bytes = encoded(rec.key, rec.value.0);
    let decoded = WalRecord::decode(&bytes).unwrap();
    assert_eq!(decoded, rec);
    assert_eq!(decoded.header().checksum, rec.header().checksum);
    assert_eq!(
        u64::from_le_bytes(bytes[8..16].try_into().unwrap()),
        record_checksum(&rec.key, rec.value)
    );
}

#[test]
fn tombstone_record_roundtrip() {
    let bytes = encoded(key(5), 0);
    let rec = WalRecord::decode(&bytes).unwrap();
    assert!(rec.value.is_tombstone());
}

#[test]
fn any_flipped_payload_bit_is_detected() {
    let bytes = encoded(Key::new(1, 100, 12, 34), 9999);
    for byte in HEADER_BYTES..RECORD_BYTES {
        for bit in 0..8 {
            let mut damaged = bytes;
            damaged[byte] ^= 1 << bit;
            assert!(
                matches!(
                    WalRecord::decode(&damaged),
                    Err(WalError::ChecksumMismatch { .. })
                ),
                "flip of byte {} bit {} went unnoticed",
                byte,
                bit
            );
        }
    }
}

#[test]
fn reserved_bits_are_not_checksummed() {
    let bytes = encoded(Key::new(1, 100, 12, 34), 9999);
    for byte in 6..8 {
        for bit in 0..8 {
            let mut altered = bytes;
            altered[byte] ^= 1 << bit;
            let rec = WalRecord::decode(&altered).unwrap();
            assert_eq!(rec.value, Value(9999));
        }
    }
}

#[test]
fn bad_magic_is_rejected() {
    let mut bytes = encoded(key(1), 1);
    bytes[0] ^= 0xFF;
    assert!(matches!(WalRecord::decode(&bytes), Err(WalError::BadMagic(_))));
}

#[test]
fn unknown_version_is_rejected() {
    let mut bytes = encoded(key(1), 1);
    bytes[4..6].copy_from_slice(&2u16.to_le_bytes());
    assert!(matches!(
        WalRecord::decode(&bytes),
        Err(WalError::UnsupportedVersion(2))
    ));
}

// -------------------- Writer --------------------

#[test]
fn write_sync_and_replay_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("citybits.wal");

    let mut w = WalWriter::open(&path, 4096).unwrap();
    w.append(&key(1), Value(10)).unwrap();
    w.append(&key(2), Value(20)).unwrap();
    w.append(&key(1), Value::TOMBSTONE).unwrap();
    w.sync().unwrap();
    assert_eq!(w.buffered_bytes(), 0);
    assert_eq!(w.records_appended(), 3);

    let recs = replay_all(&path).unwrap();
    assert_eq!(
        recs,
        vec![
            WalRecord::new(key(1), Value(10)),
            WalRecord::new(key(2), Value(20)),
            WalRecord::new(key(1), Value::TOMBSTONE),
        ]
    );
}

#[test]
fn append_below_threshold_stays_buffered() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("citybits.wal");

    let mut w = WalWriter::open(&path, 4096).unwrap();
    w.append(&key(1), Value(1)).unwrap();
    assert_eq!(w.buffered_bytes(), RECORD_BYTES);
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);

    w.flush(false).unwrap();
    assert_eq!(w.buffered_bytes(), 0);
    assert_eq!(fs::metadata(&path).unwrap().len(), RECORD_BYTES as u64);
}

#[test]
fn threshold_crossings_flush_without_explicit_sync() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("citybits.wal");

    let mut w = WalWriter::open(&path, 64).unwrap();

    w.append(&key(1), Value(1)).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    w.append(&key(2), Value(2)).unwrap(); // 64 bytes pending -> flush #1
    assert_eq!(fs::metadata(&path).unwrap().len(), 64);
    assert_eq!(w.buffered_bytes(), 0);

    w.append(&key(3), Value(3)).unwrap();
    w.append(&key(4), Value(4)).unwrap(); // flush #2
    assert_eq!(fs::metadata(&path).unwrap().len(), 128);

    // read while the writer is still alive: no sync() and no drop yet
    let recs = replay_all(&path).unwrap();
    let expected: Vec<WalRecord> = (1..=4)
        .map(|i| WalRecord::new(key(i), Value(u64::from(i))))
        .collect();
    assert_eq!(recs, expected);
    drop(w);
}

#[test]
fn zero_threshold_writes_every_append() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("citybits.wal");

    let mut w = WalWriter::open(&path, 0).unwrap();
    for i in 0..5 {
        w.append(&key(i), Value(7)).unwrap();
        assert_eq!(
            fs::metadata(&path).unwrap().len(),
            (u64::from(i) + 1) * RECORD_BYTES as u64
        );
    }
}

#[test]
fn drop_flushes_pending_batch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("citybits.wal");

    {
        let mut w = WalWriter::open(&path, 1 << 20).unwrap();
        for i in 0..10 {
            w.append(&key(i), Value(u64::from(i) + 1)).unwrap();
        }
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    assert_eq!(replay_all(&path).unwrap().len(), 10);
}

#[test]
fn reopen_appends_after_existing_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("citybits.wal");

    {
        let mut w = WalWriter::open(&path, 4096).unwrap();
        w.append(&key(1), Value(1)).unwrap();
    }
    {
        let mut w = WalWriter::open(&path, 4096).unwrap();
        w.append(&key(2), Value(2)).unwrap();
    }

    let recs = replay_all(&path).unwrap();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].key, key(1));
    assert_eq!(recs[1].key, key(2));
}

#[test]
fn open_in_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("no/such/dir/citybits.wal");
    assert!(matches!(WalWriter::open(&path, 64), Err(WalError::Io(_))));
}

#[cfg(target_os = "linux")]
#[test]
fn failed_flush_withdraws_the_rejected_record() {
    // every write to /dev/full fails with ENOSPC
    let full = std::path::Path::new("/dev/full");
    if !full.exists() {
        return;
    }

    let mut w = WalWriter::open(full, 0).unwrap();
    assert!(w.append(&key(1), Value(7)).is_err());
    assert_eq!(w.buffered_bytes(), 0);
    assert_eq!(w.records_appended(), 0);

    assert!(w.append(&key(2), Value(8)).is_err());
    assert_eq!(w.buffered_bytes(), 0);
    assert_eq!(w.records_appended(), 0);
}

#[cfg(target_os = "linux")]
#[test]
fn failed_flush_keeps_earlier_accepted_records() {
    let full = std::path::Path::new("/dev/full");
    if !full.exists() {
        return;
    }

    let mut w = WalWriter::open(full, 2 * RECORD_BYTES).unwrap();
    w.append(&key(1), Value(1)).unwrap();
    assert_eq!(w.buffered_bytes(), RECORD_BYTES);

    // crossing the threshold fails; only the first record stays queued
    assert!(w.append(&key(2), Value(2)).is_err());
    assert_eq!(w.buffered_bytes(), RECORD_BYTES);
    assert_eq!(w.records_appended(), 1);
}

// -------------------- Reader --------------------

#[test]
fn empty_wal_replays_nothing() {
    let (recs, valid) = replay_from_bytes(&[]).unwrap();
    assert!(recs.is_empty());
    assert_eq!(valid, 0);
}

#[test]
fn partial_tail_is_ignored() {
    let mut data = Vec::new();
    data.extend_from_slice(&encoded(key(1), 1));
    data.extend_from_slice(&encoded(key(2), 2));
    data.extend_from_slice(&encoded(key(3), 3)[..10]);

    let (recs, valid) = replay_from_bytes(&data).unwrap();
    assert_eq!(recs.len(), 2);
    assert_eq!(valid, 64);
}

#[test]
fn corrupt_final_record_is_a_torn_write() {
    let mut data = Vec::new();
    data.extend_from_slice(&encoded(key(1), 1));
    let mut last = encoded(key(2), 2);
    last[RECORD_BYTES - 1] ^= 0x01;
    data.extend_from_slice(&last);

    let (recs, valid) = replay_from_bytes(&data).unwrap();
    assert_eq!(recs, vec![WalRecord::new(key(1), Value(1))]);
    assert_eq!(valid, RECORD_BYTES as u64);
}

#[test]
fn corrupt_record_followed_by_fragment_is_a_torn_write() {
    let mut data = Vec::new();
    data.extend_from_slice(&encoded(key(1), 1));
    let mut bad = encoded(key(2), 2);
    bad[18] ^= 0x02;
    data.extend_from_slice(&bad);
    data.extend_from_slice(&encoded(key(3), 3)[..RECORD_BYTES - 1]);

    let (recs, valid) = replay_from_bytes(&data).unwrap();
    assert_eq!(recs, vec![WalRecord::new(key(1), Value(1))]);
    assert_eq!(valid, RECORD_BYTES as u64);
}

#[test]
fn corrupt_interior_record_fails_replay() {
    let mut data = Vec::new();
    data.extend_from_slice(&encoded(key(1), 1));
    let mut middle = encoded(key(2), 2);
    middle[20] ^= 0x40;
    data.extend_from_slice(&middle);
    data.extend_from_slice(&encoded(key(3), 3));

    match replay_from_bytes(&data) {
        Err(WalError::CorruptInterior { offset, source }) => {
            assert_eq!(offset, RECORD_BYTES as u64);
            assert!(matches!(*source, WalError::ChecksumMismatch { .. }));
        }
        other => panic!("expected interior corruption, got {:?}", other),
    }
}

#[test]
fn open_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let res = WalReader::open(dir.path().join("missing.wal"));
    assert!(matches!(res, Err(WalError::Io(_))));
}
