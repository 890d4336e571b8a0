use crate::types::RequestMeta;
use http::Extensions;
use percent_encoding::percent_decode_str;

pub(crate) fn update_req_meta_in_extensions(ext: &mut Extensions, req_meta: RequestMeta) {
    if let Some(existing_req_meta) = ext.get_mut::<RequestMeta>() {
        existing_req_meta.extend(req_meta);
    } else {
        ext.insert(req_meta);
    }
}

pub(crate) fn req_meta(ext: &Extensions) -> Option<&RequestMeta> {
    ext.get::<RequestMeta>()
}

pub(crate) fn take_req_meta(ext: &mut Extensions) -> Option<RequestMeta> {
    ext.remove::<RequestMeta>()
}

/// Splits a request path on `/`, dropping empty segments, and percent decodes every segment.
///
/// Decoding happens after splitting so an encoded `%2F` stays inside its segment.
pub(crate) fn decode_path_segments(path: &str) -> crate::Result<Vec<String>> {
    path.split('/')
        .filter(|seg| !seg.is_empty())
        .map(|seg| {
            percent_decode_str(seg)
                .decode_utf8()
                .map(|val| val.into_owned())
                .map_err(crate::Error::from)
        })
        .collect()
}
