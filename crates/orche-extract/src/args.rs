//! Filling argument slots from parameter bindings.
//!
//! There is one extraction function per [`ParamKind`], selected by an
//! exhaustive match. The dispatcher and the interceptor chain both build
//! their arguments through [`build_args`]. Bindings that carry a
//! [`Validator`] are checked right after their slot is filled.

use std::borrow::Cow;

use orche_core::{
    Arg, Args, Exchange, NextHandle, ParamBinding, ParamKind, ParamValue, RawRequest,
    RequestMapper, Validator,
};
use serde_json::Value;

use crate::body::parse_body;
use crate::{ExtractionError, ExtractionSource};

/// Builds the argument list for one invocation.
///
/// Without bindings the unit receives `(request, response, next)`.
/// Otherwise the list is sized to the highest bound index plus one and
/// each bound slot is filled by its kind; unbound slots stay empty. The
/// first validator rejection stops extraction.
pub fn build_args(
    bindings: Option<&[ParamBinding]>,
    exchange: &Exchange,
    next: &NextHandle,
) -> Result<Args, ExtractionError> {
    let Some(bindings) = bindings.filter(|b| !b.is_empty()) else {
        return Ok(Args::native(exchange, next));
    };

    let len = bindings.iter().map(|b| b.index).max().map_or(0, |max| max + 1);
    let mut args = Args::with_len(len);
    let mut body: Option<Value> = None;

    for binding in bindings {
        let arg = extract(binding, exchange, next, &mut body)?;
        if let Some(validator) = &binding.validator {
            validate(binding, &arg, validator)?;
        }
        args.set(binding.index, arg);
    }
    Ok(args)
}

fn extract(
    binding: &ParamBinding,
    exchange: &Exchange,
    next: &NextHandle,
    body: &mut Option<Value>,
) -> Result<Arg, ExtractionError> {
    match binding.kind {
        ParamKind::RawRequest => Ok(Arg::Request(exchange.request().clone())),
        ParamKind::RawResponse => Ok(Arg::Response(exchange.response().clone())),
        ParamKind::NextHandle => Ok(Arg::Next(next.clone())),
        ParamKind::PathParam => path_param(binding, &exchange.request().read()),
        ParamKind::QueryParam => query_param(binding, &exchange.request().read()),
        ParamKind::HeaderParam => header_param(binding, &exchange.request().read()),
        ParamKind::BodyParam => body_param(binding, &exchange.request().read(), body),
        ParamKind::RequestMapper => Ok(Arg::Mapper(request_mapper(&exchange.request().read()))),
    }
}

fn validate(binding: &ParamBinding, arg: &Arg, validator: &Validator) -> Result<(), ExtractionError> {
    let (source, value) = match arg {
        Arg::Value(value) => (source_of(binding.kind), Cow::Owned(value.to_json())),
        Arg::Body(value) => (ExtractionSource::Body, Cow::Borrowed(value)),
        _ => {
            tracing::debug!(kind = %binding.kind, index = binding.index, "validator ignored on non-value binding");
            return Ok(());
        }
    };

    validator.check(&value).map_err(|details| {
        tracing::debug!(
            source = %source,
            name = binding.name.as_deref().unwrap_or_default(),
            "parameter rejected"
        );
        ExtractionError::invalid(source, binding.name.as_deref(), details)
    })
}

fn source_of(kind: ParamKind) -> ExtractionSource {
    match kind {
        ParamKind::PathParam => ExtractionSource::Path,
        ParamKind::QueryParam => ExtractionSource::Query,
        ParamKind::HeaderParam => ExtractionSource::Header,
        _ => ExtractionSource::Body,
    }
}

fn required_name(binding: &ParamBinding, source: ExtractionSource) -> Result<&str, ExtractionError> {
    binding
        .name
        .as_deref()
        .ok_or_else(|| ExtractionError::unnamed(source, binding.index))
}

fn path_param(binding: &ParamBinding, request: &RawRequest) -> Result<Arg, ExtractionError> {
    let name = required_name(binding, ExtractionSource::Path)?;
    let value = request.params.get(name).map(ToString::to_string);
    Ok(Arg::Value(ParamValue::from(value)))
}

fn query_param(binding: &ParamBinding, request: &RawRequest) -> Result<Arg, ExtractionError> {
    let name = required_name(binding, ExtractionSource::Query)?;
    let values = request.query.get(name).cloned().unwrap_or_default();
    Ok(Arg::Value(ParamValue::from_values(values)))
}

fn header_param(binding: &ParamBinding, request: &RawRequest) -> Result<Arg, ExtractionError> {
    let name = required_name(binding, ExtractionSource::Header)?;
    let values: Vec<String> = request
        .headers
        .get_all(name.to_ascii_lowercase().as_str())
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(ToString::to_string)
        .collect();
    Ok(Arg::Value(ParamValue::from_values(values)))
}

fn body_param(
    binding: &ParamBinding,
    request: &RawRequest,
    cache: &mut Option<Value>,
) -> Result<Arg, ExtractionError> {
    static NULL: Value = Value::Null;
    if cache.is_none() {
        *cache = Some(parse_body(request.content_type().as_ref(), &request.body)?);
    }
    let parsed = cache.as_ref().unwrap_or(&NULL);

    let value = match binding.name.as_deref() {
        Some(field) => parsed.get(field).cloned().unwrap_or(Value::Null),
        None => parsed.clone(),
    };
    Ok(Arg::Body(value))
}

/// Builds the request-mapper facade for a request.
pub fn request_mapper(request: &RawRequest) -> RequestMapper {
    RequestMapper::new(
        request
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string())),
        request
            .query
            .iter()
            .map(|(k, v)| (k.clone(), ParamValue::from_values(v.clone()))),
        request.headers.iter().filter_map(|(k, v)| {
            v.to_str()
                .ok()
                .map(|v| (k.as_str().to_string(), v.to_string()))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Method;
    use orche_core::Param;
    use serde_json::json;

    fn exchange() -> Exchange {
        let mut request = RawRequest::new(Method::POST, "/orche/computers/42");
        request.params.push("uuid", "42");
        request.query.insert("size".into(), vec!["10".into()]);
        request.query.insert("tag".into(), vec!["a".into(), "b".into()]);
        request.set_header("Authorization", "Bearer abc");
        request.set_header("Content-Type", "application/json");
        request.body = Bytes::from(r#"{"name": "mac", "ram": 16}"#);
        Exchange::new(request)
    }

    #[test]
    fn test_no_bindings_is_native_order() {
        let ex = exchange();
        let args = build_args(None, &ex, &NextHandle::new()).unwrap();
        assert_eq!(args.len(), 3);
        assert!(args.next(2).is_ok());

        let args = build_args(Some(&[][..]), &ex, &NextHandle::new()).unwrap();
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_slots_sized_by_max_index() {
        let ex = exchange();
        let bindings = vec![Param::path("uuid").at(3)];
        let args = build_args(Some(bindings.as_slice()), &ex, &NextHandle::new()).unwrap();
        assert_eq!(args.len(), 4);
        assert!(args.get(0).is_none());
        assert_eq!(args.text(3).unwrap(), Some("42"));
    }

    #[test]
    fn test_each_kind() {
        let ex = exchange();
        let bindings = vec![
            Param::request().at(0),
            Param::response().at(1),
            Param::next().at(2),
            Param::path("uuid").at(3),
            Param::query("size").at(4),
            Param::header("authorization").at(5),
            Param::body().at(6),
            Param::body_field("name").at(7),
            Param::mapper().at(8),
            Param::query("tag").at(9),
        ];
        let args = build_args(Some(bindings.as_slice()), &ex, &NextHandle::new()).unwrap();

        assert!(args.request(0).is_ok());
        assert!(args.response(1).is_ok());
        assert!(args.next(2).is_ok());
        assert_eq!(args.text(3).unwrap(), Some("42"));
        assert_eq!(args.text(4).unwrap(), Some("10"));
        assert_eq!(args.text(5).unwrap(), Some("Bearer abc"));
        assert_eq!(args.body(6).unwrap(), &json!({"name": "mac", "ram": 16}));
        assert_eq!(args.body(7).unwrap(), &json!("mac"));
        assert_eq!(args.mapper(8).unwrap().path_param("uuid"), Some("42"));
        assert_eq!(
            args.value(9).unwrap(),
            &ParamValue::List(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_missing_sources_are_missing_values() {
        let ex = exchange();
        let bindings = vec![
            Param::query("absent").at(0),
            Param::header("x-absent").at(1),
            Param::body_field("absent").at(2),
        ];
        let args = build_args(Some(bindings.as_slice()), &ex, &NextHandle::new()).unwrap();
        assert_eq!(args.text(0).unwrap(), None);
        assert_eq!(args.text(1).unwrap(), None);
        assert_eq!(args.body(2).unwrap(), &Value::Null);
    }

    #[test]
    fn test_unnamed_path_binding_fails() {
        let ex = exchange();
        let bindings = vec![ParamBinding::new(ParamKind::PathParam, None, 0)];
        let err = build_args(Some(bindings.as_slice()), &ex, &NextHandle::new()).unwrap_err();
        assert_eq!(err.extraction_source(), ExtractionSource::Path);
    }

    #[test]
    fn test_validators_see_json_views() {
        let ex = exchange();
        let bindings = vec![
            Param::path("uuid").validate(|v| {
                assert_eq!(v, &json!("42"));
                Ok(())
            }).at(0),
            Param::query("tag").validate(|v| {
                assert_eq!(v, &json!(["a", "b"]));
                Ok(())
            }).at(1),
            Param::query("absent").validate(|v| {
                assert!(v.is_null());
                Ok(())
            }).at(2),
            Param::body_field("ram").validate(|v| {
                assert_eq!(v, &json!(16));
                Ok(())
            }).at(3),
            Param::request().validate(|_| Err(json!("never called"))).at(4),
        ];
        let args = build_args(Some(bindings.as_slice()), &ex, &NextHandle::new()).unwrap();
        assert_eq!(args.len(), 5);
    }

    #[test]
    fn test_rejected_value_stops_extraction() {
        let ex = exchange();
        let bindings = vec![
            Param::query("size")
                .validate(|v| match v.as_str().and_then(|s| s.parse::<u32>().ok()) {
                    Some(size) if size <= 5 => Ok(()),
                    _ => Err(json!({ "size": "at most 5" })),
                })
                .at(0),
        ];
        let err = build_args(Some(bindings.as_slice()), &ex, &NextHandle::new()).unwrap_err();
        assert!(err.is_invalid());
        assert_eq!(err.extraction_source(), ExtractionSource::Query);
        assert_eq!(err.details(), Some(&json!({ "size": "at most 5" })));
    }

    #[test]
    fn test_request_mutations_are_visible() {
        let ex = exchange();
        ex.request().write().set_header("authorization", "custom-token");
        let bindings = vec![Param::header("Authorization").at(0)];
        let args = build_args(Some(bindings.as_slice()), &ex, &NextHandle::new()).unwrap();
        assert_eq!(args.text(0).unwrap(), Some("custom-token"));
    }
}
