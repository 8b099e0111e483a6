mod common;

use common::{check_invariants, formatted, payload};
use fatfs150::{Error, FileSystem, BLOCK_SIZE, FAT_EOC};

#[test]
fn test_write_read_5000() {
    let mut fs = formatted(8);
    fs.create("a").unwrap();
    let fd = fs.open("a").unwrap();
    let data = payload(5000, 42);

    assert_eq!(fs.write(fd, &data).unwrap(), 5000);
    assert_eq!(fs.file_size(fd).unwrap(), 5000);
    assert_eq!(fs.tell(fd).unwrap(), 5000);
    assert_eq!(fs.volume_info().fat_free, 6);
    assert_eq!(fs.fat().chain_len(fs.list()[0].first_block).unwrap(), 2);
    check_invariants(&fs);

    fs.seek(fd, 0).unwrap();
    assert_eq!(fs.read_vec(fd, 5000).unwrap(), data);
    assert_eq!(fs.tell(fd).unwrap(), 5000);

    fs.close(fd).unwrap();
    fs.delete("a").unwrap();
    assert_eq!(fs.volume_info().fat_free, 8);
    check_invariants(&fs);
}

#[test]
fn test_roundtrip_sizes() {
    let mut fs = formatted(32);
    for (i, len) in [0, 1, 100, BLOCK_SIZE, BLOCK_SIZE + 1, 3 * BLOCK_SIZE - 7].into_iter().enumerate() {
        let name = format!("f{}", i);
        fs.create(&name).unwrap();
        let fd = fs.open(&name).unwrap();
        let data = payload(len, i as u64);
        assert_eq!(fs.write(fd, &data).unwrap(), len);
        fs.seek(fd, 0).unwrap();
        let back = fs.read_vec(fd, len).unwrap();
        assert_eq!(back, data, "length {}", len);
        fs.close(fd).unwrap();
        log!("{} bytes -> {} blocks free", len, fs.volume_info().fat_free);
    }
    check_invariants(&fs);
}

#[test]
fn test_empty_write_is_noop() {
    let mut fs = formatted(8);
    fs.create("a").unwrap();
    let fd = fs.open("a").unwrap();
    let writes = fs.device().writes;
    assert_eq!(fs.write(fd, &[]).unwrap(), 0);
    assert_eq!(fs.device().writes, writes);
    assert_eq!(fs.list()[0].first_block, FAT_EOC);
    assert_eq!(fs.volume_info().fat_free, 8);
}

#[test]
fn test_overwrite_inside_block() {
    let mut fs = formatted(8);
    fs.create("a").unwrap();
    let fd = fs.open("a").unwrap();
    let original = payload(6000, 1);
    let patch = payload(5000, 2);
    fs.write(fd, &original).unwrap();

    fs.seek(fd, 100).unwrap();
    assert_eq!(fs.write(fd, &patch).unwrap(), 5000);
    assert_eq!(fs.tell(fd).unwrap(), 5100);
    assert_eq!(fs.file_size(fd).unwrap(), 6000);

    let mut expected = original.clone();
    expected[100..5100].copy_from_slice(&patch);
    fs.seek(fd, 0).unwrap();
    assert_eq!(fs.read_vec(fd, 6000).unwrap(), expected);
    assert_eq!(fs.volume_info().fat_free, 6);
    check_invariants(&fs);
}

#[test]
fn test_write_across_block_boundary() {
    let mut fs = formatted(8);
    fs.create("a").unwrap();
    let fd = fs.open("a").unwrap();
    fs.write(fd, &vec![b'x'; 4000]).unwrap();
    assert_eq!(fs.write(fd, &vec![b'y'; 200]).unwrap(), 200);
    assert_eq!(fs.file_size(fd).unwrap(), 4200);

    fs.seek(fd, 3990).unwrap();
    let back = fs.read_vec(fd, 100).unwrap();
    let mut expected = vec![b'x'; 10];
    expected.extend(vec![b'y'; 90]);
    assert_eq!(back, expected);
    check_invariants(&fs);
}

#[test]
fn test_append_at_block_end() {
    let mut fs = formatted(8);
    fs.create("a").unwrap();
    let fd = fs.open("a").unwrap();
    let head = payload(BLOCK_SIZE, 3);
    fs.write(fd, &head).unwrap();
    assert_eq!(fs.volume_info().fat_free, 7);

    let size = fs.file_size(fd).unwrap();
    fs.seek(fd, size).unwrap();
    assert_eq!(fs.write(fd, b"tail").unwrap(), 4);
    assert_eq!(fs.file_size(fd).unwrap(), BLOCK_SIZE + 4);
    assert_eq!(fs.volume_info().fat_free, 6);

    fs.seek(fd, BLOCK_SIZE - 2).unwrap();
    let back = fs.read_vec(fd, 6).unwrap();
    assert_eq!(&back[..2], &head[BLOCK_SIZE - 2..]);
    assert_eq!(&back[2..], b"tail");
    check_invariants(&fs);
}

#[test]
fn test_seek_bounds() {
    let mut fs = formatted(8);
    fs.create("a").unwrap();
    let fd = fs.open("a").unwrap();
    fs.seek(fd, 0).unwrap();
    assert_eq!(fs.seek(fd, 1), Err(Error::OffsetOutOfRange));
    fs.write(fd, b"hello").unwrap();
    fs.seek(fd, 5).unwrap();
    assert_eq!(fs.seek(fd, 6), Err(Error::OffsetOutOfRange));
    assert_eq!(fs.tell(fd).unwrap(), 5);
}

#[test]
fn test_read_at_end() {
    let mut fs = formatted(8);
    fs.create("a").unwrap();
    let fd = fs.open("a").unwrap();
    let mut buf = [0u8; 16];
    assert_eq!(fs.read(fd, &mut buf).unwrap(), 0);

    fs.write(fd, b"hello world").unwrap();
    assert_eq!(fs.read(fd, &mut buf).unwrap(), 0);

    fs.seek(fd, 6).unwrap();
    assert_eq!(fs.read(fd, &mut buf).unwrap(), 5);
    assert_eq!(&buf[..5], b"world");
    assert_eq!(fs.tell(fd).unwrap(), 11);
    assert_eq!(fs.read(fd, &mut buf).unwrap(), 0);
}

#[test]
fn test_sequential_reads_advance() {
    let mut fs = formatted(8);
    fs.create("a").unwrap();
    let fd = fs.open("a").unwrap();
    let data = payload(3 * BLOCK_SIZE, 9);
    fs.write(fd, &data).unwrap();
    fs.seek(fd, 0).unwrap();

    let mut back = Vec::new();
    loop {
        let chunk = fs.read_vec(fd, 1000).unwrap();
        if chunk.is_empty() {
            break;
        }
        back.extend(chunk);
    }
    assert_eq!(back, data);
}

#[test]
fn test_handles_share_file() {
    let mut fs = formatted(8);
    fs.create("a").unwrap();
    let writer = fs.open("a").unwrap();
    let reader = fs.open("a").unwrap();
    fs.write(writer, b"shared data").unwrap();

    assert_eq!(fs.file_size(reader).unwrap(), 11);
    assert_eq!(fs.tell(reader).unwrap(), 0);
    assert_eq!(fs.read_vec(reader, 64).unwrap(), b"shared data");

    fs.seek(reader, 0).unwrap();
    fs.write(reader, b"S").unwrap();
    fs.seek(writer, 0).unwrap();
    assert_eq!(fs.read_vec(writer, 6).unwrap(), b"Shared");
}

#[test]
fn test_short_write_when_full() {
    let mut fs = formatted(4);
    fs.create("big").unwrap();
    let fd = fs.open("big").unwrap();
    let data = payload(5 * BLOCK_SIZE, 11);

    let written = fs.write(fd, &data).unwrap();
    assert_eq!(written, 4 * BLOCK_SIZE);
    assert_eq!(fs.file_size(fd).unwrap(), written);
    assert_eq!(fs.volume_info().fat_free, 0);
    check_invariants(&fs);

    fs.seek(fd, 0).unwrap();
    assert_eq!(fs.read_vec(fd, written).unwrap(), &data[..written]);
    // The offset sits at the end of a full chain with no block left to grow into.
    assert_eq!(fs.write(fd, b"more").unwrap(), 0);

    fs.create("empty").unwrap();
    let other = fs.open("empty").unwrap();
    assert_eq!(fs.write(other, b"x").unwrap(), 0);
    assert_eq!(fs.file_size(other).unwrap(), 0);
    check_invariants(&fs);
}

#[test]
fn test_partial_block_short_write() {
    let mut fs = formatted(2);
    fs.create("a").unwrap();
    let fd = fs.open("a").unwrap();
    fs.write(fd, &vec![1u8; 100]).unwrap();
    let written = fs.write(fd, &vec![2u8; 2 * BLOCK_SIZE]).unwrap();
    assert_eq!(written, 2 * BLOCK_SIZE - 100);
    assert_eq!(fs.file_size(fd).unwrap(), 2 * BLOCK_SIZE);

    fs.seek(fd, 0).unwrap();
    let back = fs.read_vec(fd, 2 * BLOCK_SIZE).unwrap();
    assert!(back[..100].iter().all(|&b| b == 1));
    assert!(back[100..].iter().all(|&b| b == 2));
    check_invariants(&fs);
}

#[test]
fn test_freed_blocks_are_reused() {
    let mut fs = formatted(4);
    fs.create("a").unwrap();
    fs.create("b").unwrap();
    let a = fs.open("a").unwrap();
    fs.write(a, &payload(4 * BLOCK_SIZE, 5)).unwrap();
    fs.close(a).unwrap();
    fs.delete("a").unwrap();

    let b = fs.open("b").unwrap();
    let data = payload(2 * BLOCK_SIZE + 10, 6);
    assert_eq!(fs.write(b, &data).unwrap(), data.len());
    assert_eq!(fs.list()[0].first_block, 0);
    fs.seek(b, 0).unwrap();
    assert_eq!(fs.read_vec(b, data.len()).unwrap(), data);
    check_invariants(&fs);
}

#[test]
fn test_grow_after_low_block_freed() {
    let mut fs = formatted(8);
    fs.create("a").unwrap();
    fs.create("b").unwrap();
    let a = fs.open("a").unwrap();
    fs.write(a, b"x").unwrap();
    fs.close(a).unwrap();

    let b = fs.open("b").unwrap();
    let first = payload(BLOCK_SIZE, 21);
    fs.write(b, &first).unwrap();
    assert_eq!(fs.list()[1].first_block, 1);

    fs.delete("a").unwrap();
    assert_eq!(fs.fat().find_free(), Some(0));

    let second = payload(BLOCK_SIZE + 300, 22);
    assert_eq!(fs.write(b, &second).unwrap(), second.len());
    assert_eq!(fs.fat().get(1), Some(2));
    assert_eq!(fs.fat().chain_len(1).unwrap(), 3);
    check_invariants(&fs);

    let mut expected = first.clone();
    expected.extend(&second);
    fs.seek(b, 0).unwrap();
    assert_eq!(fs.read_vec(b, expected.len()).unwrap(), expected);
    fs.close(b).unwrap();

    let disk = fs.unmount().ok().unwrap();
    let mut fs = FileSystem::mount(disk).unwrap();
    check_invariants(&fs);
    let b = fs.open("b").unwrap();
    assert_eq!(fs.read_vec(b, expected.len()).unwrap(), expected);

    // Block 0 remains usable as the head of a new file.
    fs.create("c").unwrap();
    let c = fs.open("c").unwrap();
    assert_eq!(fs.write(c, b"head").unwrap(), 4);
    assert_eq!(fs.list()[0].first_block, 0);
    check_invariants(&fs);
}
