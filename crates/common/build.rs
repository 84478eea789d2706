use tonic_build::manual::{Builder, Method, Service};

fn main() {
    // Mirrors agent's `grpc.EventService`: a single `Ready(Empty) -> Empty` call.
    // Stubs are generated manually, so no protoc is needed at build time.
    let event = Service::builder()
        .name("EventService")
        .package("grpc")
        .method(
            Method::builder()
                .name("ready")
                .route_name("Ready")
                .input_type("crate::pb::Empty")
                .output_type("crate::pb::Empty")
                .codec_path("tonic::codec::ProstCodec")
                .build(),
        )
        .build();

    Builder::new().compile(&[event]);
    println!("cargo:rerun-if-changed=build.rs");
}
