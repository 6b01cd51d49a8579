use std::fmt::{self, Display};
use std::io;

use bytes::{Buf, Bytes};
use http_body_util::BodyExt;
use hyper::body::Body;
use serde::Deserialize;
use serde::de::{
    DeserializeSeed, Deserializer as _, Error as _, IgnoredAny, MapAccess, SeqAccess, Visitor,
};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::engine::errors::EngineError;
use crate::engine::stream::{ItemSender, StreamChannel};
use crate::engine::traits::ResultHandle;
use crate::engine::types::Binding;

/// Frames buffered between the body reader and the blocking decoder.
const FRAME_BUFFER: usize = 16;

#[derive(Debug, Deserialize)]
struct Head {
    #[serde(default)]
    vars: Vec<String>,
}

/// What a document turned out to be, known before its rows are decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsHeader {
    Boolean(bool),
    Bindings(Vec<String>),
}

#[derive(Debug, PartialEq)]
pub enum ParsedResults {
    Boolean(bool),
    Bindings {
        variables: Vec<String>,
        rows: Vec<Binding>,
    },
}

/// Receives a results document as it is decoded.
///
/// `header` is called exactly once per document and always before the first `row`.
pub trait RowSink {
    fn header(&mut self, header: ResultsHeader);

    /// Returns `false` to stop decoding.
    fn row(&mut self, row: Binding) -> bool;
}

/// Decodes a `application/sparql-results+json` document held in memory.
pub fn parse_results(body: &[u8]) -> Result<ParsedResults, EngineError> {
    let mut collected = Collected::default();
    read_document(body, &mut collected)?;
    match collected.header {
        Some(ResultsHeader::Boolean(value)) => Ok(ParsedResults::Boolean(value)),
        Some(ResultsHeader::Bindings(variables)) => Ok(ParsedResults::Bindings {
            variables,
            rows: collected.rows,
        }),
        None => Err(missing_results()),
    }
}

/// Decodes a results document from `reader`, pushing rows into `sink` one at a time.
///
/// When `results` follows `head`, rows reach the sink while the rest of the
/// document is still unread. A `results` member that precedes `head` is held
/// back until the variables are known.
pub fn read_document<R: io::Read, S: RowSink>(reader: R, sink: &mut S) -> Result<(), EngineError> {
    let mut de = serde_json::Deserializer::from_reader(reader);
    (&mut de)
        .deserialize_map(DocumentVisitor { sink })
        .and_then(|_| de.end())
        .map_err(|err| {
            if err.is_io() {
                EngineError::Stream(err.to_string())
            } else {
                EngineError::Parse(err.to_string())
            }
        })
}

/// Starts decoding a SPARQL JSON response body and resolves once its shape is known.
///
/// SELECT rows keep arriving on the returned stream while the body downloads.
pub async fn stream_handle<B>(body: B, capacity: usize) -> Result<ResultHandle, EngineError>
where
    B: Body<Data = Bytes> + Send + Unpin + 'static,
    B::Error: Display + Send,
{
    let (frames_tx, frames_rx) = mpsc::channel(FRAME_BUFFER);
    let (header_tx, header_rx) = oneshot::channel();
    let (sender, stream) = StreamChannel::bounded(capacity);

    let reader = tokio::spawn(forward_frames(body, frames_tx));
    let decoder = tokio::task::spawn_blocking(move || {
        let mut sink = ChannelSink {
            header: Some(header_tx),
            rows: sender,
            emitted: 0,
        };
        match read_document(FrameReader::new(frames_rx), &mut sink) {
            Ok(()) if sink.header.is_some() => sink.fail(missing_results()),
            Ok(()) => {
                debug!(
                    target: "fed_sparql::engine",
                    emitted = sink.emitted,
                    "SPARQL JSON body exhausted"
                );
            }
            Err(err) => sink.fail(err),
        }
    });
    let stream = stream.with_task(reader).with_task(decoder);

    match header_rx.await {
        Ok(Ok(ResultsHeader::Boolean(value))) => Ok(ResultHandle::Boolean(value)),
        Ok(Ok(ResultsHeader::Bindings(variables))) => {
            Ok(ResultHandle::Bindings { variables, stream })
        }
        Ok(Err(err)) => Err(err),
        Err(_) => Err(EngineError::Stream(
            "results decoder stopped before the document shape was known".to_string(),
        )),
    }
}

fn missing_results() -> EngineError {
    EngineError::Parse("document has neither `boolean` nor `results`".to_string())
}

#[derive(Default)]
struct Collected {
    header: Option<ResultsHeader>,
    rows: Vec<Binding>,
}

impl RowSink for Collected {
    fn header(&mut self, header: ResultsHeader) {
        self.header = Some(header);
    }

    fn row(&mut self, row: Binding) -> bool {
        self.rows.push(row);
        true
    }
}

struct ChannelSink {
    header: Option<oneshot::Sender<Result<ResultsHeader, EngineError>>>,
    rows: ItemSender<Binding>,
    emitted: usize,
}

impl ChannelSink {
    /// Reports `err` to whoever is listening: the caller while the shape is
    /// still unknown, the row consumer afterwards.
    fn fail(&mut self, err: EngineError) {
        match self.header.take() {
            Some(header) => {
                let _ = header.send(Err(err));
            }
            None => {
                let _ = self.rows.blocking_fail(err);
            }
        }
    }
}

impl RowSink for ChannelSink {
    fn header(&mut self, header: ResultsHeader) {
        if let Some(tx) = self.header.take() {
            let _ = tx.send(Ok(header));
        }
    }

    fn row(&mut self, row: Binding) -> bool {
        if self.rows.blocking_send(row).is_err() {
            return false;
        }
        self.emitted += 1;
        true
    }
}

async fn forward_frames<B>(mut body: B, frames: mpsc::Sender<Result<Bytes, String>>)
where
    B: Body<Data = Bytes> + Unpin,
    B::Error: Display,
{
    loop {
        match body.frame().await {
            Some(Ok(frame)) => {
                let Ok(data) = frame.into_data() else {
                    continue;
                };
                if frames.send(Ok(data)).await.is_err() {
                    return;
                }
            }
            Some(Err(err)) => {
                let _ = frames.send(Err(err.to_string())).await;
                return;
            }
            None => return,
        }
    }
}

/// Blocking `io::Read` over body frames forwarded from the runtime.
struct FrameReader {
    frames: mpsc::Receiver<Result<Bytes, String>>,
    current: Bytes,
}

impl FrameReader {
    fn new(frames: mpsc::Receiver<Result<Bytes, String>>) -> Self {
        Self {
            frames,
            current: Bytes::new(),
        }
    }
}

impl io::Read for FrameReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.current.is_empty() {
            match self.frames.blocking_recv() {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(message)) => return Err(io::Error::other(message)),
                None => return Ok(0),
            }
        }
        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current.advance(n);
        Ok(n)
    }
}

struct DocumentVisitor<'a, S> {
    sink: &'a mut S,
}

impl<'de, S: RowSink> Visitor<'de> for DocumentVisitor<'_, S> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a SPARQL results object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let mut variables: Option<Vec<String>> = None;
        let mut boolean: Option<bool> = None;
        let mut held: Option<Vec<Binding>> = None;
        let mut streamed = false;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "head" => variables = Some(map.next_value::<Head>()?.vars),
                "boolean" => boolean = Some(map.next_value()?),
                "results" => match variables.take() {
                    Some(vars) => {
                        self.sink.header(ResultsHeader::Bindings(vars));
                        streamed = true;
                        map.next_value_seed(ResultsSeed {
                            target: RowTarget::Sink(&mut *self.sink),
                        })?;
                    }
                    None => {
                        let mut rows = Vec::new();
                        map.next_value_seed(ResultsSeed {
                            target: RowTarget::<S>::Hold(&mut rows),
                        })?;
                        held = Some(rows);
                    }
                },
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        if streamed {
            return Ok(());
        }
        if let Some(value) = boolean {
            self.sink.header(ResultsHeader::Boolean(value));
            return Ok(());
        }
        if let Some(rows) = held {
            self.sink
                .header(ResultsHeader::Bindings(variables.unwrap_or_default()));
            for row in rows {
                if !self.sink.row(row) {
                    return Err(A::Error::custom("result consumer went away"));
                }
            }
        }
        Ok(())
    }
}

enum RowTarget<'a, S> {
    Sink(&'a mut S),
    Hold(&'a mut Vec<Binding>),
}

impl<S: RowSink> RowTarget<'_, S> {
    fn push(&mut self, row: Binding) -> bool {
        match self {
            RowTarget::Sink(sink) => sink.row(row),
            RowTarget::Hold(rows) => {
                rows.push(row);
                true
            }
        }
    }
}

struct ResultsSeed<'a, S> {
    target: RowTarget<'a, S>,
}

impl<'de, S: RowSink> DeserializeSeed<'de> for ResultsSeed<'_, S> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_map(self)
    }
}

impl<'de, S: RowSink> Visitor<'de> for ResultsSeed<'_, S> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a `results` object")
    }

    fn visit_map<A: MapAccess<'de>>(mut self, mut map: A) -> Result<(), A::Error> {
        while let Some(key) = map.next_key::<String>()? {
            if key == "bindings" {
                map.next_value_seed(BindingsSeed {
                    target: &mut self.target,
                })?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

struct BindingsSeed<'a, 'b, S> {
    target: &'b mut RowTarget<'a, S>,
}

impl<'de, S: RowSink> DeserializeSeed<'de> for BindingsSeed<'_, '_, S> {
    type Value = ();

    fn deserialize<D: serde::Deserializer<'de>>(self, deserializer: D) -> Result<(), D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de, S: RowSink> Visitor<'de> for BindingsSeed<'_, '_, S> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an array of bindings")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<(), A::Error> {
        while let Some(row) = seq.next_element::<Binding>()? {
            if !self.target.push(row) {
                return Err(A::Error::custom("result consumer went away"));
            }
        }
        Ok(())
    }
}
