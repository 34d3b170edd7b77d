// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Conversions between snappy-compressed remote storage payloads and the adapter model.

use std::convert::TryFrom;

use prost::Message;
use snap::raw::{Decoder, Encoder};

use adapter::model::matcher::{MatchType, Matcher};
use adapter::model::request::{Query, ReadRequest, ReadResponse};
use adapter::model::sample::{Label, Sample};
use adapter::utils::error::PlanningError;

use crate::prompb;
use crate::utils::error::ServerError;

pub fn snappy_decompress(buf: &[u8]) -> Result<Vec<u8>, ServerError> {
  Decoder::new()
    .decompress_vec(buf)
    .map_err(|e| ServerError::SnappyError(e.to_string()))
}

pub fn snappy_compress(buf: &[u8]) -> Result<Vec<u8>, ServerError> {
  Encoder::new()
    .compress_vec(buf)
    .map_err(|e| ServerError::SnappyError(e.to_string()))
}

/// Decode a remote write body into one sample per (series, sample) pair.
pub fn decode_write_request(body: &[u8]) -> Result<Vec<Sample>, ServerError> {
  let decompressed = snappy_decompress(body)?;
  let request = prompb::WriteRequest::decode(decompressed.as_slice())
    .map_err(|e| ServerError::DecodeError(e.to_string()))?;

  let mut samples = Vec::new();
  for timeseries in request.timeseries {
    let labels: Vec<Label> = timeseries
      .labels
      .iter()
      .map(|label| Label::new(&label.name, &label.value))
      .collect();
    for sample in timeseries.samples {
      samples.push(Sample::new(labels.clone(), sample.timestamp, sample.value));
    }
  }

  Ok(samples)
}

/// Decode a remote read body. Matchers are converted separately, see [`to_read_request`].
pub fn decode_read_request(body: &[u8]) -> Result<prompb::ReadRequest, ServerError> {
  let decompressed = snappy_decompress(body)?;
  prompb::ReadRequest::decode(decompressed.as_slice())
    .map_err(|e| ServerError::DecodeError(e.to_string()))
}

pub fn to_read_request(request: prompb::ReadRequest) -> Result<ReadRequest, PlanningError> {
  let mut queries = Vec::with_capacity(request.queries.len());
  for query in request.queries {
    let mut matchers = Vec::with_capacity(query.matchers.len());
    for matcher in query.matchers {
      let match_type = MatchType::try_from(matcher.r#type)?;
      matchers.push(Matcher::new(&matcher.name, match_type, &matcher.value));
    }
    queries.push(Query {
      start_ms: query.start_timestamp_ms,
      end_ms: query.end_timestamp_ms,
      matchers,
    });
  }

  Ok(ReadRequest { queries })
}

fn to_prompb_response(response: &ReadResponse) -> prompb::ReadResponse {
  let results = response
    .results
    .iter()
    .map(|result| prompb::QueryResult {
      timeseries: result
        .timeseries
        .iter()
        .map(|series| prompb::TimeSeries {
          labels: series
            .get_labels()
            .iter()
            .map(|label| prompb::Label {
              name: label.name.clone(),
              value: label.value.clone(),
            })
            .collect(),
          samples: series
            .get_metric_points()
            .iter()
            .map(|metric_point| prompb::Sample {
              value: metric_point.get_value(),
              timestamp: metric_point.get_time(),
            })
            .collect(),
        })
        .collect(),
    })
    .collect();

  prompb::ReadResponse { results }
}

/// Encode a read response as a snappy-compressed protobuf payload.
pub fn encode_read_response(response: &ReadResponse) -> Result<Vec<u8>, ServerError> {
  snappy_compress(&to_prompb_response(response).encode_to_vec())
}
