use byteorder::{BigEndian, WriteBytesExt};
use carzone::server::{self, Reply, Request};
use carzone::{BodyType, FuelType, Listing, ListingStatus, MemoryStorage, NewListing, Transmission};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Starts a server over an in-memory inventory on an ephemeral port.
pub async fn start_test_server(listings: Vec<Listing>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    let storage = Arc::new(MemoryStorage::with_listings(listings));

    tokio::spawn(async move {
        if let Err(e) = server::serve(listener, storage).await {
            eprintln!("Test server stopped: {e}");
        }
    });

    addr
}

pub async fn connect_to_server(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(addr)
        .await
        .expect("Failed to connect to test server")
}

/// Sends a raw frame body and returns the raw reply body.
pub async fn send_frame(stream: &mut TcpStream, body: &[u8]) -> TestResult<Vec<u8>> {
    let mut message = Vec::new();
    WriteBytesExt::write_u32::<BigEndian>(&mut message, u32::try_from(body.len())?)?;
    message.extend_from_slice(body);
    stream.write_all(&message).await?;

    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let response_len = u32::from_be_bytes(len_buf) as usize;

    let mut response_buf = vec![0u8; response_len];
    stream.read_exact(&mut response_buf).await?;
    Ok(response_buf)
}

pub async fn send_request<T: DeserializeOwned>(
    stream: &mut TcpStream,
    request: &Request,
) -> TestResult<Reply<T>> {
    let body = rmp_serde::to_vec_named(request)?;
    let reply = send_frame(stream, &body).await?;
    Ok(rmp_serde::from_slice(&reply)?)
}

/// Sends `request` and unwraps a successful result.
#[allow(dead_code)]
pub async fn expect_result<T: DeserializeOwned>(stream: &mut TcpStream, request: &Request) -> T {
    match send_request(stream, request)
        .await
        .expect("Failed to send request")
    {
        Reply::Success { result, .. } => result,
        Reply::Failure { error } => panic!("{} failed: {error}", request.op()),
    }
}

#[allow(dead_code)]
pub async fn expect_error(stream: &mut TcpStream, request: &Request) -> String {
    match send_request::<serde::de::IgnoredAny>(stream, request)
        .await
        .expect("Failed to send request")
    {
        Reply::Failure { error } => error,
        Reply::Success { .. } => panic!("{} unexpectedly succeeded", request.op()),
    }
}

#[allow(dead_code)]
pub fn list_cars(query: &str) -> Request {
    Request::ListCars {
        params: None,
        query: Some(query.to_string()),
    }
}

#[allow(dead_code)]
pub fn timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + seconds, 0).expect("timestamp in range")
}

#[allow(dead_code)]
pub fn create_listing(id: &str, make: &str, price: i64, created: i64) -> Listing {
    Listing {
        id: id.to_string(),
        make: make.to_string(),
        model: "Base".to_string(),
        year: 2020,
        price: Decimal::from(price),
        mileage: 25_000,
        color: "White".to_string(),
        fuel_type: FuelType::Petrol,
        transmission: Transmission::Automatic,
        body_type: BodyType::Sedan,
        seats: Some(5),
        description: String::new(),
        status: ListingStatus::Available,
        featured: false,
        images: vec![format!("https://cdn.example/cars/{id}/image-0.jpeg")],
        created_at: timestamp(created),
        updated_at: timestamp(created),
    }
}

#[allow(dead_code)]
pub fn create_new_listing(make: &str, model: &str, price: i64) -> NewListing {
    NewListing {
        make: make.to_string(),
        model: model.to_string(),
        year: 2022,
        price: Decimal::from(price),
        mileage: 12_000,
        color: "Grey".to_string(),
        fuel_type: FuelType::Electric,
        transmission: Transmission::Automatic,
        body_type: BodyType::Suv,
        seats: Some(5),
        description: format!("{make} {model} in great condition"),
        status: ListingStatus::Available,
        featured: false,
        images: vec!["https://cdn.example/uploads/front.jpeg".to_string()],
    }
}
