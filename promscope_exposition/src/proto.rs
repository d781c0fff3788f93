//! Module containing structs generated from the Prometheus client model

/// Protobuf definitions of the Prometheus client data model
pub mod io {
    /// The `io.prometheus` package
    pub mod prometheus {
        /// `io.prometheus.client`, the exposition messages
        pub mod client {
            #![allow(clippy::pedantic)]
            #![allow(missing_docs)]
            #![allow(unreachable_pub)]
            include!("proto/io.prometheus.client.rs");
        }
    }
}

pub use io::prometheus::client::*;
