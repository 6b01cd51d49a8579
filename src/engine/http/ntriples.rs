use std::fmt::Display;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Body;
use tracing::debug;

use crate::engine::errors::EngineError;
use crate::engine::stream::{ItemSender, ItemStream, StreamChannel};
use crate::engine::types::{Quad, Term};

peg::parser! {
    grammar ntriples_line() for str {
        rule _() = quiet!{[' ' | '\t' | '\r' | '\n']*}

        rule comment() = "#" [_]*

        rule eol() = _ comment()? ![_]

        pub rule line() -> Option<Quad>
            = eol() { None }
            / _ s:subject() _ p:iri() _ o:object() _ g:graph()? "." eol() {
                Some(Quad { subject: s, predicate: p, object: o, graph: g })
            }

        rule subject() -> Term = iri() / blank()

        rule object() -> Term = iri() / blank() / literal()

        rule graph() -> Term = t:(iri() / blank()) _ { t }

        rule iri() -> Term = v:iri_ref() { Term::iri(v) }

        rule iri_ref() -> String
            = "<" cs:iri_char()* ">" { cs.into_iter().collect() }
            / expected!("IRI")

        rule iri_char() -> char
            = uchar()
            / c:[^ '>' | '<' | '"' | '\\' | ' ' | '\t' | '\r' | '\n'] { c }

        // A label may contain '.' but never end with one, so `_:b1.` closes the statement.
        rule blank() -> Term
            = "_:" l:$(label_char() ("."* label_char())*) { Term::blank(l) }

        rule label_char()
            = ['a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '\u{80}'..='\u{10FFFF}']

        rule literal() -> Term
            = v:quoted() "@" l:$(['a'..='z' | 'A'..='Z']+ ("-" ['a'..='z' | 'A'..='Z' | '0'..='9']+)*) {
                Term::lang_literal(v, l)
            }
            / v:quoted() "^^" d:iri_ref() { Term::typed_literal(v, d) }
            / v:quoted() { Term::literal(v) }

        rule quoted() -> String
            = "\"" cs:string_char()* "\"" { cs.into_iter().collect() }
            / expected!("quoted literal")

        rule string_char() -> char
            = echar()
            / uchar()
            / c:[^ '"' | '\\' | '\r' | '\n'] { c }

        rule echar() -> char
            = "\\" c:['t' | 'b' | 'n' | 'r' | 'f' | '"' | '\'' | '\\'] {
                match c {
                    't' => '\t',
                    'b' => '\u{8}',
                    'n' => '\n',
                    'r' => '\r',
                    'f' => '\u{c}',
                    other => other,
                }
            }

        rule uchar() -> char
            = "\\u" h:$(hex()*<4>) {? scalar(h) }
            / "\\U" h:$(hex()*<8>) {? scalar(h) }

        rule hex() = ['0'..='9' | 'a'..='f' | 'A'..='F']
    }
}

fn scalar(hex: &str) -> Result<char, &'static str> {
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or("unicode scalar value")
}

/// Parses one N-Triples / N-Quads line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Quad>, EngineError> {
    ntriples_line::line(line).map_err(|e| EngineError::Parse(format!("N-Triples {}", e)))
}

/// Streams statements out of an N-Triples response body as frames arrive.
pub fn spawn_stream<B>(body: B, capacity: usize) -> ItemStream<Quad>
where
    B: Body<Data = Bytes> + Send + Unpin + 'static,
    B::Error: Display + Send,
{
    let (sender, stream) = StreamChannel::bounded(capacity);
    let task = tokio::spawn(pump_lines(body, sender));
    stream.with_task(task)
}

pub(crate) async fn pump_lines<B>(mut body: B, sender: ItemSender<Quad>)
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Display,
{
    let mut pending: Vec<u8> = Vec::new();
    let mut emitted = 0usize;

    loop {
        match body.frame().await {
            Some(Ok(frame)) => {
                let Ok(data) = frame.into_data() else {
                    continue;
                };
                pending.extend_from_slice(&data);
                while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    match emit(&sender, &line).await {
                        Ok(true) => emitted += 1,
                        Ok(false) => {}
                        Err(()) => return,
                    }
                }
            }
            Some(Err(err)) => {
                let _ = sender.fail(EngineError::Stream(err.to_string())).await;
                return;
            }
            None => break,
        }
    }

    if !pending.is_empty() && matches!(emit(&sender, &pending).await, Ok(true)) {
        emitted += 1;
    }

    debug!(target: "fed_sparql::engine", emitted, "N-Triples body exhausted");
}

/// `Ok(true)` when a statement was sent, `Ok(false)` for a skipped line,
/// `Err(())` once the stream is finished (consumer gone or error reported).
async fn emit(sender: &ItemSender<Quad>, line: &[u8]) -> Result<bool, ()> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text,
        Err(err) => {
            let _ = sender.fail(EngineError::Parse(err.to_string())).await;
            return Err(());
        }
    };

    match parse_line(text) {
        Ok(Some(quad)) => sender.send(quad).await.map(|_| true).map_err(|_| ()),
        Ok(None) => Ok(false),
        Err(err) => {
            let _ = sender.fail(err).await;
            Err(())
        }
    }
}
