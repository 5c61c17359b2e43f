//! Framing over real sockets

use std::io::{Cursor, Read};
use std::net::{TcpListener, TcpStream};
use std::thread;

use cypher_crypto::aes::{Aes128, AesKey};
use cypher_crypto::rsa::RsaKeyPair;
use cypher_protocol::message::{
    data_frame, decode_public_key, open_data_frame, open_sealed_key, public_key_frame,
    sealed_key_frame,
};
use cypher_protocol::{read_frame, write_frame, CodecConfig, Frame, FrameDecoder, FrameHeader};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const LENGTHS: [usize; 7] = [0, 1, 15, 16, 17, 4096, 1 << 20];

fn tagged_frame(len: usize) -> Frame {
    let header = FrameHeader {
        pad_flag: 0x11,
        pad_size: 0x22,
        enc_flag: 0x33,
        enc_type: 0x44,
        key_flag: 0x55,
        key_type: 0x66,
        hash_flag: 0x77,
        hash_type: 0x88,
        ..FrameHeader::new(0)
    };
    Frame::with_header(header, (0..len).map(|i| (i % 251) as u8).collect())
}

fn connected_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).unwrap();
    let (server, _) = listener.accept().unwrap();
    (client, server)
}

#[test_log::test]
fn frames_survive_tcp_loopback() {
    let (mut client, mut server) = connected_pair();

    let writer = thread::spawn(move || {
        for len in LENGTHS {
            write_frame(&mut client, &tagged_frame(len)).unwrap();
        }
    });

    let config = CodecConfig::default();
    for len in LENGTHS {
        let frame = read_frame(&mut server, &config).unwrap();
        assert_eq!(frame, tagged_frame(len), "length {len}");
    }
    writer.join().unwrap();
}

#[test]
fn closed_connection_reports_peer_closed() {
    let (client, mut server) = connected_pair();
    drop(client);
    let err = read_frame(&mut server, &CodecConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        cypher_protocol::ProtocolError::PeerClosed { stage: "header", .. }
    ));
}

#[test_log::test]
fn full_transfer_sequence() {
    let (mut client, mut server) = connected_pair();
    let file: Vec<u8> = b"the quick brown fox jumps over the lazy dog\n".repeat(50);
    let expected = file.clone();

    let sender = thread::spawn(move || {
        let config = CodecConfig::default();
        let public = decode_public_key(&read_frame(&mut client, &config).unwrap()).unwrap();
        let key = AesKey::generate().unwrap();
        write_frame(&mut client, &sealed_key_frame(&key, &public)).unwrap();
        write_frame(&mut client, &data_frame(&file, &Aes128::new(&key)).unwrap()).unwrap();
    });

    let config = CodecConfig::default();
    let mut rng = StdRng::seed_from_u64(99);
    let pair = RsaKeyPair::generate_with(32, 20, &mut rng).unwrap();
    write_frame(&mut server, &public_key_frame(&pair.public)).unwrap();
    let key = open_sealed_key(&read_frame(&mut server, &config).unwrap(), &pair.private).unwrap();
    let plaintext =
        open_data_frame(&read_frame(&mut server, &config).unwrap(), &Aes128::new(&key)).unwrap();

    sender.join().unwrap();
    assert_eq!(plaintext, expected);
}

/// Delivers the underlying bytes in the chunk sizes given
struct Chunked {
    inner: Cursor<Vec<u8>>,
    sizes: Vec<usize>,
    next: usize,
}

impl Read for Chunked {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let size = self.sizes.get(self.next).copied().unwrap_or(1).max(1);
        self.next += 1;
        let len = buf.len().min(size);
        self.inner.read(&mut buf[..len])
    }
}

proptest! {
    #[test]
    fn fragmented_delivery_decodes_identically(
        len in 0usize..300,
        sizes in prop::collection::vec(1usize..40, 0..64),
    ) {
        let frame = tagged_frame(len);
        let bytes = frame.to_bytes();

        let mut whole = FrameDecoder::new(&CodecConfig::default());
        prop_assert_eq!(whole.feed(&bytes).unwrap(), bytes.len());
        let whole = whole.finish().unwrap();

        let mut reader = Chunked { inner: Cursor::new(bytes), sizes, next: 0 };
        let pieced = read_frame(&mut reader, &CodecConfig::default()).unwrap();

        prop_assert_eq!(&pieced, &whole);
        prop_assert_eq!(pieced, frame);
    }
}
