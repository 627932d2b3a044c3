use super::*;
use crate::path::ActorPath;
use assert_matches::assert_matches;

fn sample_frame(payload: &str) -> Frame {
    Frame::new(
        Id::new(),
        ActorUri::remote(
            "RemoteSystem",
            "127.0.0.1",
            5050,
            ActorPath::user("remoteActor"),
        ),
        Some(ActorUri::remote(
            "LocalSystem",
            "127.0.0.1",
            2727,
            ActorPath::user("localActor"),
        )),
        Message::Element {
            payload: payload.to_string(),
        },
    )
}

#[test]
fn test_wire_frame_encode_decode() {
    let frame = sample_frame("test");

    let encoded = frame.encode().unwrap();

    // Verify the length prefix
    let mut prefix_bytes = encoded.slice(0..8);
    assert_eq!(prefix_bytes.get_u64(), (encoded.len() - 8) as u64);

    // Decode the body
    let decoded = Frame::decode(encoded.slice(8..encoded.len())).unwrap();

    assert_eq!(decoded.to, frame.to);
    assert_eq!(decoded.from, frame.from);
    assert_eq!(decoded.msg, frame.msg);
    assert_eq!(decoded.header.origin, frame.header.origin);
    assert_eq!(decoded.header.protocol_version, CURRENT_PROTOCOL_VERSION);
}

#[test]
fn test_absent_sender_round_trips() {
    let frame = Frame::new(
        Id::new(),
        ActorUri::local("Solo", ActorPath::user("sink")),
        None,
        Message::Generate,
    );

    let encoded = frame.encode().unwrap();
    let decoded = Frame::decode(encoded.slice(8..encoded.len())).unwrap();
    assert_eq!(decoded.from, None);
    assert_eq!(decoded.msg, Message::Generate);
}

#[test]
fn test_foreign_protocol_version_is_rejected() {
    let mut frame = sample_frame("test");
    frame.header.protocol_version = 99;

    // Encoding does not care about the version; decoding does.
    let encoded = frame.encode().unwrap();
    let error = Frame::decode(encoded.slice(8..encoded.len())).unwrap_err();
    assert_matches!(
        error,
        WireError::ProtocolVersionMismatch {
            expected: CURRENT_PROTOCOL_VERSION,
            actual: 99
        }
    );
}

#[test]
fn test_parser_handles_split_input() {
    let frame1 = sample_frame("test1");
    let frame2 = sample_frame("test2");

    let encoded1 = frame1.encode().unwrap();
    let encoded2 = frame2.encode().unwrap();

    let mut parser = FrameParser::new();

    // Partial data, no complete frame yet
    parser.extend(&encoded1[0..4]);
    assert!(parser.parse().unwrap().is_none());

    // The rest of the first frame
    parser.extend(&encoded1[4..]);
    let parsed1 = parser.parse().unwrap().unwrap();
    assert!(parser.parse().unwrap().is_none());

    parser.extend(&encoded2);
    let parsed2 = parser.parse().unwrap().unwrap();
    assert!(parser.parse().unwrap().is_none());

    assert_eq!(parsed1.msg, frame1.msg);
    assert_eq!(parsed2.msg, frame2.msg);
}

#[test]
fn test_parse_all_drains_buffered_frames() {
    let frames = [sample_frame("a"), sample_frame("b"), sample_frame("c")];

    let mut parser = FrameParser::new();
    for frame in &frames {
        parser.extend(&frame.encode().unwrap());
    }

    let parsed = parser.parse_all().unwrap();
    assert_eq!(parsed.len(), 3);
    for (parsed, original) in parsed.iter().zip(&frames) {
        assert_eq!(parsed.msg, original.msg);
    }
}

#[test_log::test(tokio::test)]
async fn test_reader_writer_round_trip() {
    let (client, server) = tokio::io::duplex(4096);
    let mut writer = FrameWriter::new(client);
    let mut reader = FrameReader::new(server);

    let frame1 = sample_frame("first");
    let frame2 = sample_frame("second");
    writer.write_frame(&frame1).await.unwrap();
    writer.write_frame(&frame2).await.unwrap();

    let read1 = reader.read_frame().await.unwrap().unwrap();
    let read2 = reader.read_frame().await.unwrap().unwrap();
    assert_eq!(read1.msg, frame1.msg);
    assert_eq!(read2.msg, frame2.msg);

    // Closing the write side ends the stream on a frame boundary.
    drop(writer);
    assert!(reader.read_frame().await.unwrap().is_none());
}

#[test]
fn test_net_addr_parse_and_display() {
    let addr: NetAddr = "10.0.3.7:5050".parse().unwrap();
    assert_eq!(addr, NetAddr::new("10.0.3.7", 5050));
    assert_eq!(addr.to_string(), "10.0.3.7:5050");

    assert!("5050".parse::<NetAddr>().is_err());
    assert!(":5050".parse::<NetAddr>().is_err());
    assert!("host:notaport".parse::<NetAddr>().is_err());
}
