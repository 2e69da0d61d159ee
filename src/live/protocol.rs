//! The line-oriented control protocol spoken with the live gateway before
//! the binary stream starts: the CRAM handshake, subscription requests, and
//! the DBN stream preamble.
//!
//! Everything here is generic over [`Read`]/[`Write`] so the handshake can be
//! exercised without a socket. None of it is performance sensitive; control
//! messages are only exchanged during session setup.

use std::io::{self, Read, Write};

use log::debug;
use sha2::{Digest, Sha256};

use crate::{
    enums::{SType, Schema},
    error::{Error, Result},
    DBN_VERSION,
};

/// The TCP port of the live subscription gateway.
pub(crate) const LIVE_GATEWAY_PORT: u16 = 13_000;

/// The domain suffix of live subscription gateways.
const GATEWAY_DOMAIN: &str = "lsg.databento.com";

/// The maximum number of symbols the gateway accepts in one subscription
/// request.
pub(crate) const MAX_SYMBOLS_PER_REQUEST: usize = 1_000;

/// The special symbol for subscribing to every symbol in a dataset.
pub(crate) const ALL_SYMBOLS: &str = "ALL_SYMBOLS";

/// The number of characters at the end of an API key that identify the
/// account bucket.
pub(crate) const BUCKET_ID_LENGTH: usize = 5;

/// Returns the gateway hostname for `dataset`: every `.` replaced with `-`,
/// followed by the gateway domain.
pub(crate) fn gateway_host(dataset: &str) -> String {
    let subdomain: String = dataset
        .chars()
        .map(|c| if c == '.' { '-' } else { c })
        .collect();
    format!("{subdomain}.{GATEWAY_DOMAIN}")
}

/// Receives one `\n`-terminated control message, reading a byte at a time.
/// The terminator is trimmed.
pub(crate) fn read_control_line<R: Read>(reader: &mut R) -> Result<String> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Err(Error::ConnectionLost),
            Ok(_) => {
                if byte[0] == b'\n' {
                    if !line.is_ascii() {
                        return Err(Error::Protocol("non-ASCII control message".to_owned()));
                    }
                    return String::from_utf8(line)
                        .map_err(|_| Error::Protocol("non-ASCII control message".to_owned()));
                }
                line.push(byte[0]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(e, "reading control message")),
        }
    }
}

/// Returns the value of the field under `key` in a `|`-separated control
/// message: the substring between `<key>=` and the next `|` or the end of
/// the message. Returns `None` if the key is absent or sits at the very end
/// of the message.
pub(crate) fn find_field<'a>(msg: &'a str, key: &str) -> Option<&'a str> {
    let start = msg.find(key)? + key.len();
    if start >= msg.len().saturating_sub(1) {
        return None;
    }
    let value = &msg[start + 1..];
    Some(value.split('|').next().unwrap_or(value))
}

/// Builds the authentication reply for a CRAM `challenge`: the lowercase hex
/// SHA-256 of `<challenge>|<api_key>`, dash, the bucket ID (the last five
/// characters of the key).
pub(crate) fn auth_response(challenge: &str, api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{challenge}|{api_key}").as_bytes());
    let digest = hasher.finalize();
    let bucket_id = &api_key[api_key.len() - BUCKET_ID_LENGTH..];
    format!("{}-{bucket_id}", hex::encode(digest))
}

/// Performs the three-line handshake with the gateway: greeting, CRAM
/// challenge, authentication reply, and the gateway's verdict.
pub(crate) fn authenticate<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    api_key: &str,
    dataset: &str,
    send_ts_out: bool,
) -> Result<()> {
    let greeting = read_control_line(reader)?;
    if find_field(&greeting, "lsg_version").is_none() {
        return Err(Error::AuthDenied(
            "first control message is missing lsg_version field".to_owned(),
        ));
    }
    debug!("[{dataset}] Greeting: {greeting}");

    let challenge_msg = read_control_line(reader)?;
    let Some(challenge) = find_field(&challenge_msg, "cram") else {
        return Err(Error::AuthDenied(
            "second control message is missing cram field".to_owned(),
        ));
    };
    debug!("[{dataset}] Received CRAM challenge: {challenge}");

    let reply = format!(
        "auth={}|dataset={dataset}|encoding=dbn|ts_out={}\n",
        auth_response(challenge, api_key),
        send_ts_out as i32
    );
    writer
        .write_all(reply.as_bytes())
        .map_err(|e| Error::io(e, "sending authentication"))?;

    let verdict = read_control_line(reader)?;
    debug!("[{dataset}] Received auth response: {verdict}");
    match find_field(&verdict, "success") {
        Some("1") => Ok(()),
        Some(_) => Err(Error::AuthDenied("authentication failed".to_owned())),
        None => Err(Error::AuthDenied(
            "third control message is missing success field".to_owned(),
        )),
    }
}

/// Builds the subscription request lines for `symbols`, batched into groups
/// of at most [`MAX_SYMBOLS_PER_REQUEST`]. An empty symbol list subscribes
/// to [`ALL_SYMBOLS`]; `suffix` is appended to every symbol of a non-empty
/// list.
pub(crate) fn subscription_requests(
    schema: Schema,
    stype_in: SType,
    symbols: &[String],
    suffix: &str,
    replay: bool,
) -> Vec<String> {
    let start = if replay { "start=0|" } else { "" };
    if symbols.is_empty() {
        return vec![format!(
            "schema={schema}|stype_in={stype_in}|{start}symbols={ALL_SYMBOLS}\n"
        )];
    }
    symbols
        .chunks(MAX_SYMBOLS_PER_REQUEST)
        .enumerate()
        .map(|(i, group)| {
            let is_last = (i + 1) * MAX_SYMBOLS_PER_REQUEST >= symbols.len();
            let mut line = format!(
                "schema={schema}|stype_in={stype_in}|{start}is_last={}|symbols=",
                is_last as i32
            );
            for (j, symbol) in group.iter().enumerate() {
                if j > 0 {
                    line.push(',');
                }
                line.push_str(symbol);
                line.push_str(suffix);
            }
            line.push('\n');
            line
        })
        .collect()
}

/// Sends the subscription request lines for `symbols`.
pub(crate) fn write_subscriptions<W: Write>(
    writer: &mut W,
    schema: Schema,
    stype_in: SType,
    symbols: &[String],
    suffix: &str,
    replay: bool,
) -> Result<()> {
    for request in subscription_requests(schema, stype_in, symbols, suffix, replay) {
        writer
            .write_all(request.as_bytes())
            .map_err(|e| Error::io(e, "sending subscription request"))?;
    }
    Ok(())
}

/// Sends the line that ends the control phase. All data received afterwards
/// is DBN-encoded.
pub(crate) fn write_session_start<W: Write>(writer: &mut W) -> Result<()> {
    writer
        .write_all(b"start_session=0\n")
        .map_err(|e| Error::io(e, "starting session"))
}

/// Reads and validates the DBN stream preamble: the `DBN` signature, the
/// encoding version, and the metadata header, which is discarded.
pub(crate) fn read_preamble<R: Read>(reader: &mut R) -> Result<()> {
    let mut preheader = [0u8; 8];
    read_exact(reader, &mut preheader)?;
    if &preheader[..3] != b"DBN" {
        return Err(Error::Protocol(
            "stream header has invalid signature".to_owned(),
        ));
    }
    if preheader[3] != DBN_VERSION {
        return Err(Error::Protocol(format!(
            "stream header version {} unsupported",
            preheader[3]
        )));
    }
    let header_length = u32::from_le_bytes(preheader[4..].try_into().unwrap()) as usize;
    let mut header = vec![0u8; header_length];
    read_exact(reader, &mut header)?;
    Ok(())
}

/// `Read::read_exact` with EOF mapped to [`Error::ConnectionLost`].
fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::ConnectionLost
        } else {
            Error::io(e, "reading from socket")
        }
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    #[test]
    fn gateway_host_replaces_dots() {
        assert_eq!(
            gateway_host("OPRA.PILLAR"),
            "OPRA-PILLAR.lsg.databento.com"
        );
        assert_eq!(gateway_host("GLBX.MDP3"), "GLBX-MDP3.lsg.databento.com");
    }

    #[test]
    fn control_line_stops_at_newline() {
        let mut reader = Cursor::new(b"lsg_version=1.2.3\ncram=abc\n".to_vec());
        assert_eq!(read_control_line(&mut reader).unwrap(), "lsg_version=1.2.3");
        assert_eq!(read_control_line(&mut reader).unwrap(), "cram=abc");
        assert!(matches!(
            read_control_line(&mut reader),
            Err(Error::ConnectionLost)
        ));
    }

    #[rstest]
    #[case::simple("cram=abc", "cram", Some("abc"))]
    #[case::mid_message("a=1|cram=abc|b=2", "cram", Some("abc"))]
    #[case::value_contains_pipe_terminator("cram=a|bc", "cram", Some("a"))]
    #[case::absent("a=1|b=2", "cram", None)]
    #[case::key_at_end("a=1|cram", "cram", None)]
    #[case::empty_value_at_end("a=1|cram=", "cram", None)]
    #[case::empty_value_mid("cram=|b=2", "cram", Some(""))]
    fn field_lookup(#[case] msg: &str, #[case] key: &str, #[case] exp: Option<&str>) {
        assert_eq!(find_field(msg, key), exp);
    }

    #[test]
    fn authenticate_round_trip() {
        let mut reader = Cursor::new(b"lsg_version=1.2.3\ncram=ABC\nsuccess=1\n".to_vec());
        let mut written = Vec::new();
        authenticate(&mut reader, &mut written, "XXXXX-YYYZZ", "OPRA.PILLAR", true).unwrap();

        let mut hasher = Sha256::new();
        hasher.update(b"ABC|XXXXX-YYYZZ");
        let expected = format!(
            "auth={}-YYYZZ|dataset=OPRA.PILLAR|encoding=dbn|ts_out=1\n",
            hex::encode(hasher.finalize())
        );
        assert_eq!(String::from_utf8(written).unwrap(), expected);
    }

    #[test]
    fn authenticate_denied() {
        let mut reader = Cursor::new(b"lsg_version=1.2.3\ncram=ABC\nsuccess=0\n".to_vec());
        let mut written = Vec::new();
        let err = authenticate(&mut reader, &mut written, "XXXXX-YYYZZ", "OPRA.PILLAR", false)
            .unwrap_err();
        assert!(matches!(err, Error::AuthDenied(_)));
    }

    #[test]
    fn authenticate_requires_cram() {
        let mut reader = Cursor::new(b"lsg_version=1.2.3\nnonsense=1\n".to_vec());
        let mut written = Vec::new();
        let err = authenticate(&mut reader, &mut written, "XXXXX-YYYZZ", "OPRA.PILLAR", false)
            .unwrap_err();
        assert!(matches!(err, Error::AuthDenied(_)));
    }

    #[test]
    fn subscription_batches_of_one_thousand() {
        let symbols: Vec<String> = (0..2_001).map(|i| format!("S{i}")).collect();
        let requests =
            subscription_requests(Schema::Definition, SType::Parent, &symbols, ".OPT", false);
        assert_eq!(requests.len(), 3);
        for (request, (exp_last, exp_count)) in
            requests.iter().zip([(0, 1_000), (0, 1_000), (1, 1)])
        {
            assert!(request.starts_with("schema=definition|stype_in=parent|is_last="));
            assert!(request.contains(&format!("is_last={exp_last}|")));
            let symbol_list = request.trim_end().split_once("symbols=").unwrap().1;
            assert_eq!(symbol_list.split(',').count(), exp_count);
            assert!(symbol_list.split(',').all(|s| s.ends_with(".OPT")));
        }
    }

    #[test]
    fn subscription_all_symbols() {
        let requests = subscription_requests(Schema::Cmbp1, SType::RawSymbol, &[], ".OPT", false);
        assert_eq!(
            requests,
            vec!["schema=cmbp-1|stype_in=raw_symbol|symbols=ALL_SYMBOLS\n"]
        );
        let requests = subscription_requests(Schema::Definition, SType::Parent, &[], "", true);
        assert_eq!(
            requests,
            vec!["schema=definition|stype_in=parent|start=0|symbols=ALL_SYMBOLS\n"]
        );
    }

    #[test]
    fn subscription_replay_single_batch() {
        let symbols = vec![ALL_SYMBOLS.to_owned()];
        let requests = subscription_requests(Schema::Definition, SType::Parent, &symbols, "", true);
        assert_eq!(
            requests,
            vec!["schema=definition|stype_in=parent|start=0|is_last=1|symbols=ALL_SYMBOLS\n"]
        );
    }

    #[test]
    fn preamble_validation() {
        let mut ok = Cursor::new(b"DBN\x01\x04\x00\x00\x00abcd".to_vec());
        read_preamble(&mut ok).unwrap();
        assert_eq!(ok.position(), 12);

        let mut bad_signature = Cursor::new(b"DBZ\x01\x00\x00\x00\x00".to_vec());
        assert!(matches!(
            read_preamble(&mut bad_signature),
            Err(Error::Protocol(_))
        ));

        let mut bad_version = Cursor::new(b"DBN\x02\x00\x00\x00\x00".to_vec());
        assert!(matches!(
            read_preamble(&mut bad_version),
            Err(Error::Protocol(_))
        ));

        let mut truncated = Cursor::new(b"DBN\x01\x04\x00\x00\x00ab".to_vec());
        assert!(matches!(
            read_preamble(&mut truncated),
            Err(Error::ConnectionLost)
        ));
    }
}
