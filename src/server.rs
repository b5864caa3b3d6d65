
use crate::aggregator::FilterOptionAggregator;
use crate::executor::{DEFAULT_FEATURED_LIMIT, ListingExecutor};
use crate::extraction::{
    Extraction, ListingSuggestion, SearchExtraction, parse_listing_suggestion,
    parse_search_extraction,
};
use crate::inventory::InventoryService;
use crate::listing::{ListingStatus, NewListing};
use crate::planner::{Planner, SearchParams};
use crate::storage::InventoryStore;
use byteorder::{BigEndian, WriteBytesExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};

/// Frames larger than this are treated as malformed and close the connection.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    /// Either a parameter map or a raw URL query string; `params` wins.
    ListCars {
        #[serde(default)]
        params: Option<SearchParams>,
        #[serde(default)]
        query: Option<String>,
    },
    CarFilters,
    FeaturedCars {
        #[serde(default)]
        limit: Option<u32>,
    },
    GetCar {
        id: String,
    },
    SavedCars {
        user_id: String,
    },
    ToggleSaved {
        user_id: String,
        car_id: String,
    },
    AddCar {
        car: NewListing,
    },
    UpdateCarStatus {
        id: String,
        #[serde(default)]
        status: Option<ListingStatus>,
        #[serde(default)]
        featured: Option<bool>,
    },
    DeleteCar {
        id: String,
    },
    AdminCars {
        #[serde(default)]
        search: Option<String>,
    },
    /// Raw text of an image-search model reply.
    ImageSearch {
        response: String,
    },
    /// Raw text of a listing-prefill model reply.
    ExtractCar {
        response: String,
    },
}

impl Request {
    pub const fn op(&self) -> &'static str {
        match self {
            Self::ListCars { .. } => "listCars",
            Self::CarFilters => "carFilters",
            Self::FeaturedCars { .. } => "featuredCars",
            Self::GetCar { .. } => "getCar",
            Self::SavedCars { .. } => "savedCars",
            Self::ToggleSaved { .. } => "toggleSaved",
            Self::AddCar { .. } => "addCar",
            Self::UpdateCarStatus { .. } => "updateCarStatus",
            Self::DeleteCar { .. } => "deleteCar",
            Self::AdminCars { .. } => "adminCars",
            Self::ImageSearch { .. } => "imageSearch",
            Self::ExtractCar { .. } => "extractCar",
        }
    }
}

/// Every reply is one of these two maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply<T> {
    Failure {
        error: String,
    },
    Success {
        result: T,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedState {
    pub saved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub deleted: bool,
}

/// Catalog search derived from a photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSearchResult {
    pub params: SearchParams,
    pub query: String,
    pub extraction: SearchExtraction,
}

/// The request handlers, shared by every connection.
pub struct Catalog {
    planner: Planner,
    executor: ListingExecutor,
    aggregator: FilterOptionAggregator,
    inventory: InventoryService,
}

impl Catalog {
    pub fn new(storage: Arc<dyn InventoryStore>) -> Self {
        Self {
            planner: Planner::new(),
            executor: ListingExecutor::new(storage.clone()),
            aggregator: FilterOptionAggregator::new(storage.clone()),
            inventory: InventoryService::new(storage),
        }
    }

    /// Handles one request and returns the encoded reply body.
    pub async fn handle(&self, request: Request) -> anyhow::Result<Vec<u8>> {
        match request {
            Request::ListCars { params, query } => {
                let params = params
                    .or_else(|| query.map(|q| SearchParams::from_query_string(&q)))
                    .unwrap_or_default();

                let corpus = self.aggregator.price_range().await?;
                let spec = self.planner.plan(&params, &corpus);
                let result = self.executor.execute(&spec).await?;
                let explanation = format!(
                    "{}\nReturned {} of {} listings in {}ms",
                    self.planner.explain(&spec),
                    result.stats.rows_returned,
                    result.stats.total_matched,
                    result.stats.duration_ms
                );

                encode(&result.page, Some(explanation))
            }
            Request::CarFilters => encode(&self.aggregator.filter_options().await?, None),
            Request::FeaturedCars { limit } => {
                let limit = limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
                encode(&self.executor.featured(limit).await?, None)
            }
            Request::GetCar { id } => encode(&self.executor.listing(&id).await?, None),
            Request::SavedCars { user_id } => {
                encode(&self.inventory.saved_listings(&user_id).await?, None)
            }
            Request::ToggleSaved { user_id, car_id } => {
                let saved = self.inventory.toggle_saved(&user_id, &car_id).await?;
                encode(&SavedState { saved }, None)
            }
            Request::AddCar { car } => encode(&self.inventory.add_listing(car).await?, None),
            Request::UpdateCarStatus {
                id,
                status,
                featured,
            } => encode(
                &self.inventory.update_listing(&id, status, featured).await?,
                None,
            ),
            Request::DeleteCar { id } => {
                let deleted = self.inventory.delete_listing(&id).await?;
                encode(&DeleteOutcome { deleted }, None)
            }
            Request::AdminCars { search } => {
                encode(&self.inventory.admin_listings(search.as_deref()).await?, None)
            }
            Request::ImageSearch { response } => {
                let extraction = parse_search_extraction(&response)?;
                let params = extraction.to_search_params();
                let query = params.to_query_string();
                encode(
                    &ImageSearchResult {
                        params,
                        query,
                        extraction,
                    },
                    None,
                )
            }
            Request::ExtractCar { response } => {
                let extraction: Extraction<ListingSuggestion> =
                    parse_listing_suggestion(&response).into();
                match &extraction {
                    Extraction::Fields { data } => {
                        debug!("Listing extracted with confidence {:.2}", data.confidence());
                    }
                    Extraction::Failed { error } => warn!("Listing extraction failed: {error}"),
                }
                encode(&extraction, None)
            }
        }
    }
}

pub async fn start_server(storage: Arc<dyn InventoryStore>, address: &str) -> anyhow::Result<()> {
    let listener = TcpListener::bind(address).await?;
    info!("CarZone server listening on {address}");
    serve(listener, storage).await
}

/// Accepts connections on an already bound listener until it fails.
pub async fn serve(listener: TcpListener, storage: Arc<dyn InventoryStore>) -> anyhow::Result<()> {
    let catalog = Arc::new(Catalog::new(storage));

    loop {
        let (stream, _) = listener.accept().await?;
        let catalog = catalog.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(catalog, stream).await {
                error!("Client error: {e}");
            }
        });
    }
}

async fn handle_client(catalog: Arc<Catalog>, stream: TcpStream) -> anyhow::Result<()> {
    let peer = stream.peer_addr()?;
    debug!("Connection from {peer}");
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    loop {
        let mut len_buf = [0u8; 4];
        if reader.read_exact(&mut len_buf).await.is_err() {
            break;
        }
        let msg_len = u32::from_be_bytes(len_buf) as usize;
        if msg_len > MAX_FRAME_LEN {
            warn!("Closing {peer}: frame of {msg_len} bytes exceeds {MAX_FRAME_LEN}");
            break;
        }

        let mut buffer = vec![0u8; msg_len];
        if reader.read_exact(&mut buffer).await.is_err() {
            break;
        }

        let payload = process_frame(&catalog, &buffer).await.or_else(|err| {
            warn!("Failed to process request from {peer}: {err}");
            encode_failure(&err.to_string())
        })?;

        write_frame(&mut write_half, &payload).await?;
    }

    debug!("Connection from {peer} closed");
    Ok(())
}

async fn process_frame(catalog: &Catalog, frame: &[u8]) -> anyhow::Result<Vec<u8>> {
    let request: Request = rmp_serde::from_slice(frame)?;
    debug!("{}", request.op());
    catalog.handle(request).await
}

async fn write_frame(writer: &mut OwnedWriteHalf, payload: &[u8]) -> anyhow::Result<()> {
    let mut out: Vec<u8> = Vec::with_capacity(payload.len() + 4);
    WriteBytesExt::write_u32::<BigEndian>(&mut out, u32::try_from(payload.len())?)?;
    out.extend_from_slice(payload);

    writer.write_all(&out).await?;
    Ok(())
}

fn encode<T: Serialize>(result: &T, explanation: Option<String>) -> anyhow::Result<Vec<u8>> {
    let reply = Reply::Success {
        result,
        explanation,
    };
    Ok(rmp_serde::to_vec_named(&reply)?)
}

fn encode_failure(error: &str) -> anyhow::Result<Vec<u8>> {
    let reply: Reply<()> = Reply::Failure {
        error: error.to_string(),
    };
    Ok(rmp_serde::to_vec_named(&reply)?)
}
