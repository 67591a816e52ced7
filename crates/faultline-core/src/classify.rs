//! Request classification for intercepted proxy traffic.
//!
//! A pure function of method, host, and path. The result drives both the
//! injector (CloudFetch downloads) and the call recorder (Thrift calls);
//! everything else passes through untouched.

/// Classification of an intercepted HTTP exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// GET of query result data from cloud object storage.
    CloudFetchDownload,
    /// Binary RPC request against the SQL warehouse.
    ThriftCall,
    /// Anything else; proxied untouched and never recorded.
    Other,
}

/// Object-storage host suffixes that identify CloudFetch result downloads.
const CLOUD_STORAGE_HOSTS: [&str; 3] = [
    "blob.core.windows.net",
    "s3.amazonaws.com",
    "storage.googleapis.com",
];

/// Route fragments used by the Thrift-over-HTTP endpoints. The REST-style
/// execution API lives under `/api/2.0/sql/statements` and must never
/// classify as a Thrift call.
const THRIFT_ROUTES: [&str; 2] = ["/sql/1.0/warehouses/", "/sql/1.0/endpoints/"];

/// Classify an intercepted request from its method, host, and path.
pub fn classify(method: &str, host: &str, path: &str) -> RequestClass {
    if is_cloudfetch_download(method, host) {
        RequestClass::CloudFetchDownload
    } else if is_thrift_call(method, path) {
        RequestClass::ThriftCall
    } else {
        RequestClass::Other
    }
}

fn is_cloudfetch_download(method: &str, host: &str) -> bool {
    if !method.eq_ignore_ascii_case("GET") {
        return false;
    }
    let host = host.to_ascii_lowercase();
    CLOUD_STORAGE_HOSTS
        .iter()
        .any(|suffix| host.contains(suffix))
}

fn is_thrift_call(method: &str, path: &str) -> bool {
    if !method.eq_ignore_ascii_case("POST") {
        return false;
    }
    THRIFT_ROUTES.iter().any(|route| path.contains(route))
}
