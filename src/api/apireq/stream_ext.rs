use super::JsonStreamParser;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

/// A type-erased response body, so parsers can be stored in named types.
pub(crate) type BodyStream = BoxStream<'static, reqwest::Result<Bytes>>;

pub(crate) trait ReqwestResponseStreamExt {
    fn stream_ndjson(self) -> JsonStreamParser<BodyStream>;
}

impl ReqwestResponseStreamExt for reqwest::Response {
    fn stream_ndjson(self) -> JsonStreamParser<BodyStream> {
        JsonStreamParser::new(self.bytes_stream().boxed())
    }
}
