use super::*;
use test_case::test_case;

const ITEM_SIZE_LIMIT: u32 = 1024;

fn decoder() -> MemcacheTextDecoder {
    MemcacheTextDecoder::new(ITEM_SIZE_LIMIT)
}

fn decode_all(decoder: &mut MemcacheTextDecoder, src: &mut BytesMut) -> Vec<TextRequest> {
    let mut requests = Vec::new();
    while let Some(request) = decoder.decode(src).unwrap() {
        requests.push(request);
    }
    requests
}

fn decode_one(input: &'static str) -> TextRequest {
    let mut src = BytesMut::from(input);
    let mut decoder = decoder();
    let request = decoder.decode(&mut src).unwrap();
    match request {
        Some(request) => request,
        None => unreachable!(),
    }
}

fn malformed(command: &str, error: CacheError, noreply: bool) -> TextRequest {
    TextRequest::Malformed(MalformedRequest {
        command: String::from(command),
        error,
        noreply,
    })
}

#[test]
fn incomplete_line_needs_more_data() {
    let mut src = BytesMut::from("get fo");
    let mut decoder = decoder();
    assert_eq!(decoder.decode(&mut src).unwrap(), None);
    assert_eq!(&src[..], b"get fo");
}

#[test]
fn decode_set_request() {
    let request = decode_one("set foo 5 0 3\r\nbar\r\n");
    assert_eq!(
        request,
        TextRequest::Set(SetRequest {
            key: Bytes::from("foo"),
            flags: 5,
            exptime: 0,
            value: Bytes::from("bar"),
            noreply: false,
        })
    );
}

#[test]
fn decode_set_with_noreply() {
    let request = decode_one("set foo 0 100 3 noreply\r\nbar\r\n");
    assert!(request.is_noreply());
    if let TextRequest::Set(set) = request {
        assert_eq!(set.exptime, 100);
    } else {
        unreachable!();
    }
}

#[test]
fn data_block_may_contain_line_terminators() {
    let request = decode_one("set foo 0 0 8\r\nba\r\nr\r\n\r\n");
    if let TextRequest::Set(set) = request {
        assert_eq!(set.value, Bytes::from("ba\r\nr\r\n"));
    } else {
        unreachable!();
    }
}

#[test]
fn data_block_is_reassembled_across_reads() {
    let mut decoder = decoder();
    let mut src = BytesMut::from("set foo 0 0 10\r\n");
    assert_eq!(decoder.decode(&mut src).unwrap(), None);
    assert!(!decoder.is_awaiting_line());

    src.extend_from_slice(b"01234");
    assert_eq!(decoder.decode(&mut src).unwrap(), None);
    src.extend_from_slice(b"56789\r");
    assert_eq!(decoder.decode(&mut src).unwrap(), None);
    src.extend_from_slice(b"\n");

    match decoder.decode(&mut src).unwrap() {
        Some(TextRequest::Set(set)) => assert_eq!(set.value, Bytes::from("0123456789")),
        _ => unreachable!(),
    }
    assert!(decoder.is_awaiting_line());
    assert!(src.is_empty());
}

#[test]
fn pipelined_requests_are_decoded_in_order() {
    let mut decoder = decoder();
    let mut src = BytesMut::from("set a 0 0 1\r\n1\r\nget a b\r\ndelete a noreply\r\n");
    let requests = decode_all(&mut decoder, &mut src);
    assert_eq!(requests.len(), 3);
    assert!(matches!(requests[0], TextRequest::Set(_)));
    assert_eq!(
        requests[1],
        TextRequest::Get(GetRequest {
            keys: vec![Bytes::from("a"), Bytes::from("b")]
        })
    );
    assert_eq!(
        requests[2],
        TextRequest::Delete(DeleteRequest {
            key: Bytes::from("a"),
            noreply: true
        })
    );
}

#[test]
fn bare_newline_terminates_a_line() {
    assert_eq!(decode_one("version\n"), TextRequest::Version);
}

#[test]
fn decode_cas_request() {
    let request = decode_one("cas foo 1 2 3 12345\r\nbar\r\n");
    assert_eq!(
        request,
        TextRequest::Cas(CasRequest {
            request: SetRequest {
                key: Bytes::from("foo"),
                flags: 1,
                exptime: 2,
                value: Bytes::from("bar"),
                noreply: false,
            },
            cas_unique: 12345,
        })
    );
}

#[test_case("set\r\n", "set" ; "set without key")]
#[test_case("set foo 0 0\r\n", "set" ; "set without bytes")]
#[test_case("add foo x 0\r\n", "add" ; "non numeric flags without bytes")]
#[test_case("replace foo 0 0 -1\r\n", "replace" ; "negative bytes")]
#[test_case("cas foo 0 0\r\n", "cas" ; "cas without bytes")]
#[test_case("append\r\n", "append" ; "append without key")]
#[test_case("prepend foo 0 0\r\n", "prepend" ; "prepend with partial header")]
fn malformed_storage_line(input: &'static str, command: &str) {
    assert_eq!(
        decode_one(input),
        malformed(command, CacheError::bad_command_line(), false)
    );
}

#[test]
fn malformed_storage_line_keeps_noreply() {
    assert_eq!(
        decode_one("set foo 0 0 noreply\r\n"),
        malformed("set", CacheError::bad_command_line(), true)
    );
}

#[test_case("set foo x 0 9 noreply\r\nflush_all\r\n", "set", true ; "non numeric flags")]
#[test_case("add foo 0 x 3\r\nbar\r\n", "add", false ; "non numeric exptime")]
#[test_case("cas foo 0 0 3\r\nbar\r\n", "cas", false ; "cas without unique")]
#[test_case("cas foo 0 0 3 x\r\nbar\r\n", "cas", false ; "non numeric unique")]
#[test_case("append foo 0 0 3 extra\r\nbar\r\n", "append", false ; "append with extra argument")]
fn rejected_storage_line_discards_data_block(input: &str, command: &str, noreply: bool) {
    let mut decoder = decoder();
    let mut src = BytesMut::from(input);
    src.extend_from_slice(b"version\r\n");
    let requests = decode_all(&mut decoder, &mut src);
    assert_eq!(
        requests,
        vec![
            malformed(command, CacheError::bad_command_line(), noreply),
            TextRequest::Version
        ]
    );
}

#[test]
fn rejected_storage_line_waits_for_data_block() {
    let mut decoder = decoder();
    let mut src = BytesMut::from("set foo x 0 5\r\nfl");
    assert_eq!(decoder.decode(&mut src).unwrap(), None);
    assert!(!decoder.is_awaiting_line());

    src.extend_from_slice(b"ush\r\nget foo\r\n");
    let requests = decode_all(&mut decoder, &mut src);
    assert_eq!(
        requests,
        vec![
            malformed("set", CacheError::bad_command_line(), false),
            TextRequest::Get(GetRequest {
                keys: vec![Bytes::from("foo")]
            })
        ]
    );
    assert!(decoder.is_awaiting_line());
}

#[test]
fn too_long_key_with_data_block_is_discarded() {
    let key = "k".repeat(MAX_KEY_LENGTH + 1);
    let mut src = BytesMut::from(format!("set {} 0 0 3\r\nbar\r\nversion\r\n", key).as_str());
    let requests = decode_all(&mut decoder(), &mut src);
    assert_eq!(
        requests,
        vec![
            malformed("set", CacheError::bad_command_line(), false),
            TextRequest::Version
        ]
    );
}

#[test]
fn too_long_key_is_rejected() {
    let key = "k".repeat(MAX_KEY_LENGTH + 1);
    let mut src = BytesMut::from(format!("get {}\r\n", key).as_str());
    let request = decoder().decode(&mut src).unwrap();
    assert_eq!(
        request,
        Some(malformed("get", CacheError::bad_command_line(), false))
    );
}

#[test]
fn bad_data_chunk_terminator() {
    let mut decoder = decoder();
    let mut src = BytesMut::from("set foo 0 0 3\r\nbarXXversion\r\n");
    let requests = decode_all(&mut decoder, &mut src);
    assert_eq!(
        requests,
        vec![
            malformed(
                "set",
                CacheError::ClientError(String::from(CacheError::BAD_DATA_CHUNK)),
                false
            ),
            TextRequest::Version
        ]
    );
}

#[test]
fn item_too_large_is_skipped() {
    let mut decoder = decoder();
    let value = "x".repeat(ITEM_SIZE_LIMIT as usize + 1);
    let mut src = BytesMut::from(format!("set foo 0 0 {}\r\n", value.len()).as_str());
    assert_eq!(decoder.decode(&mut src).unwrap(), None);

    src.extend_from_slice(&value.as_bytes()[..100]);
    assert_eq!(decoder.decode(&mut src).unwrap(), None);
    assert!(src.is_empty());

    src.extend_from_slice(&value.as_bytes()[100..]);
    src.extend_from_slice(b"\r\nversion\r\n");
    let requests = decode_all(&mut decoder, &mut src);
    assert_eq!(
        requests,
        vec![
            malformed(
                "set",
                CacheError::ServerError(String::from(CacheError::OBJECT_TOO_LARGE)),
                false
            ),
            TextRequest::Version
        ]
    );
}

#[test]
fn append_with_byte_count() {
    let request = decode_one("append foo 0 0 3\r\nbar\r\n");
    assert_eq!(
        request,
        TextRequest::Append(AppendRequest {
            key: Bytes::from("foo"),
            value: Some(Bytes::from("bar")),
            noreply: false,
        })
    );
}

#[test]
fn short_append_takes_following_line() {
    let request = decode_one("prepend foo noreply\r\nbar\r\n");
    assert_eq!(
        request,
        TextRequest::Prepend(AppendRequest {
            key: Bytes::from("foo"),
            value: Some(Bytes::from("bar")),
            noreply: true,
        })
    );
}

#[test]
fn short_append_data_line_may_arrive_in_pieces() {
    let mut decoder = decoder();
    let mut src = BytesMut::from("append foo\r\nb");
    assert_eq!(decoder.decode(&mut src).unwrap(), None);

    src.extend_from_slice(b"ar\r\n");
    assert_eq!(
        decoder.decode(&mut src).unwrap(),
        Some(TextRequest::Append(AppendRequest {
            key: Bytes::from("foo"),
            value: Some(Bytes::from("bar")),
            noreply: false,
        }))
    );
}

#[test]
fn short_append_without_data() {
    let request = decode_one("append foo\r\n");
    assert_eq!(
        request,
        TextRequest::Append(AppendRequest {
            key: Bytes::from("foo"),
            value: None,
            noreply: false,
        })
    );
}

#[test]
fn decode_touch_and_delta() {
    assert_eq!(
        decode_one("touch foo -1\r\n"),
        TextRequest::Touch(TouchRequest {
            key: Bytes::from("foo"),
            exptime: -1,
            noreply: false,
        })
    );
    assert_eq!(
        decode_one("incr foo 5\r\n"),
        TextRequest::Increment(DeltaRequest {
            key: Bytes::from("foo"),
            delta: 5,
            noreply: false,
        })
    );
    assert_eq!(
        decode_one("decr foo 5 noreply\r\n"),
        TextRequest::Decrement(DeltaRequest {
            key: Bytes::from("foo"),
            delta: 5,
            noreply: true,
        })
    );
}

#[test_case("touch foo bar\r\n", "touch" ; "touch with text exptime")]
#[test_case("touch foo\r\n", "touch" ; "touch without exptime")]
#[test_case("incr foo bar\r\n", "incr" ; "incr with text delta")]
#[test_case("decr foo -1\r\n", "decr" ; "decr with negative delta")]
fn invalid_integer_arguments(input: &'static str, command: &str) {
    assert_eq!(
        decode_one(input),
        malformed(command, CacheError::invalid_integer(), false)
    );
}

#[test]
fn delete_without_key_has_empty_key() {
    assert_eq!(
        decode_one("delete\r\n"),
        TextRequest::Delete(DeleteRequest {
            key: Bytes::new(),
            noreply: false,
        })
    );
}

#[test_case("verbosity 1\r\n", Some(1), false ; "numeric level")]
#[test_case("verbosity x\r\n", None, false ; "text level")]
#[test_case("verbosity 4 noreply\r\n", Some(4), true ; "noreply")]
fn decode_verbosity(input: &'static str, level: Option<u8>, noreply: bool) {
    assert_eq!(
        decode_one(input),
        TextRequest::Verbosity(VerbosityRequest { level, noreply })
    );
}

#[test_case("flush_all\r\n", false ; "plain")]
#[test_case("flush_all 10\r\n", false ; "with delay")]
#[test_case("flush_all noreply\r\n", true ; "noreply")]
fn decode_flush_all(input: &'static str, noreply: bool) {
    assert_eq!(
        decode_one(input),
        TextRequest::FlushAll(FlushRequest { noreply })
    );
}

#[test_case("version\r\n", TextRequest::Version ; "version")]
#[test_case("stats\r\n", TextRequest::Stats ; "stats")]
#[test_case("quit\r\n", TextRequest::Quit ; "quit")]
#[test_case("bogus 1 2\r\n", TextRequest::Unknown(String::from("bogus")) ; "unknown")]
#[test_case("\r\n", TextRequest::Unknown(String::new()) ; "empty line")]
fn decode_simple_commands(input: &'static str, expected: TextRequest) {
    assert_eq!(decode_one(input), expected);
}

#[test]
fn end_of_transmission_closes() {
    let request = decode_one("\x04whatever\r\n");
    assert_eq!(request, TextRequest::EndOfTransmission);
    assert!(request.closes_connection());
}

#[test]
fn fast_mode_rejects_every_chunk() {
    let mut decoder = decoder().with_fast_mode(true);
    let mut src = BytesMut::from("get foo\r\nget bar\r\n");
    assert_eq!(
        decoder.decode(&mut src).unwrap(),
        Some(TextRequest::FastReject)
    );
    assert!(src.is_empty());
    assert_eq!(decoder.decode(&mut src).unwrap(), None);
}

#[test]
fn too_long_line_is_an_error() {
    let mut src = BytesMut::from("g".repeat(MAX_LINE_LENGTH + 1).as_str());
    let result = decoder().decode(&mut src);
    match result {
        Err(err) => assert_eq!(err.kind(), ErrorKind::InvalidData),
        Ok(_) => unreachable!(),
    }
}
