//! In-memory stand-in for the PetFriends REST API.
//!
//! Serves the same endpoints and status conventions as the live service:
//! 403 with a plain-text body for bad credentials or keys, 400 with a
//! plain-text body for rejected pet data, and 200 with an empty body for a
//! successful delete.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "demo@petfriends.test";
pub const DEMO_PASSWORD: &str = "demo-password";
pub const MAX_NAME_CHARS: usize = 80;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub id: String,
    pub name: String,
    pub animal_type: String,
    pub age: String,
    pub pet_photo: String,
    pub created_at: String,
    pub user_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PetList {
    pub pets: Vec<Pet>,
}

#[derive(Clone, Debug)]
struct Account {
    password: String,
    user_id: String,
    key: String,
}

/// Accounts by email, and every pet in creation order.
#[derive(Debug, Default)]
pub struct Store {
    accounts: HashMap<String, Account>,
    pets: Vec<Pet>,
}

impl Store {
    pub fn add_account(&mut self, email: impl Into<String>, password: impl Into<String>) {
        self.accounts.insert(
            email.into(),
            Account {
                password: password.into(),
                user_id: Uuid::new_v4().simple().to_string(),
                key: Uuid::new_v4().simple().to_string(),
            },
        );
    }

    fn user_for_key(&self, key: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.key == key)
    }

    fn owned_pet_mut(&mut self, user_id: &str, pet_id: &str) -> Option<&mut Pet> {
        self.pets
            .iter_mut()
            .find(|p| p.id == pet_id && p.user_id == user_id)
    }
}

pub type Db = Arc<RwLock<Store>>;

type Rejection = (StatusCode, String);

/// App with the demo account registered.
pub fn app() -> Router {
    app_with_accounts([(DEMO_EMAIL, DEMO_PASSWORD)])
}

pub fn app_with_accounts<E, P>(accounts: impl IntoIterator<Item = (E, P)>) -> Router
where
    E: Into<String>,
    P: Into<String>,
{
    let mut store = Store::default();
    for (email, password) in accounts {
        store.add_account(email, password);
    }
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/api/key", get(get_api_key))
        .route("/api/pets", get(list_pets).post(create_pet))
        .route("/api/create_pet_simple", post(create_pet_simple))
        .route("/api/pets/{id}", put(update_pet).delete(delete_pet))
        .route("/api/pets/set_photo/{id}", post(set_photo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

#[derive(Serialize)]
struct KeyBody {
    key: String,
}

async fn get_api_key(State(db): State<Db>, headers: HeaderMap) -> Result<Json<KeyBody>, Rejection> {
    let email = header(&headers, "email");
    let password = header(&headers, "password");
    let store = db.read().await;
    match store.accounts.get(email) {
        Some(account) if !password.is_empty() && account.password == password => Ok(Json(KeyBody {
            key: account.key.clone(),
        })),
        _ => Err(forbidden("This user wasn't found in database")),
    }
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    filter: String,
}

async fn list_pets(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<PetList>, Rejection> {
    let store = db.read().await;
    let user_id = authorize(&store, &headers)?;
    let pets = match query.filter.as_str() {
        "" => store.pets.clone(),
        "my_pets" => store
            .pets
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect(),
        _ => return Err(bad_request("Filter value is incorrect")),
    };
    Ok(Json(PetList { pets }))
}

/// Pet fields as submitted; absent fields stay `None`.
#[derive(Debug, Default, Deserialize)]
pub struct PetInput {
    pub name: Option<String>,
    pub animal_type: Option<String>,
    pub age: Option<String>,
}

struct Photo {
    content_type: String,
    bytes: Vec<u8>,
}

impl Photo {
    fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.bytes))
    }
}

async fn create_pet(State(db): State<Db>, headers: HeaderMap, multipart: Multipart) -> Result<Json<Pet>, Rejection> {
    let (input, photo) = read_multipart(multipart).await?;
    let photo = photo.ok_or_else(|| bad_request("Provide 'pet_photo' in form data"))?;
    let mut store = db.write().await;
    let user_id = authorize(&store, &headers)?;
    let pet = new_pet(&user_id, &input, Some(&photo))?;
    tracing::debug!(pet_id = %pet.id, "pet created with photo");
    store.pets.push(pet.clone());
    Ok(Json(pet))
}

async fn create_pet_simple(
    State(db): State<Db>,
    headers: HeaderMap,
    Form(input): Form<PetInput>,
) -> Result<Json<Pet>, Rejection> {
    let mut store = db.write().await;
    let user_id = authorize(&store, &headers)?;
    let pet = new_pet(&user_id, &input, None)?;
    tracing::debug!(pet_id = %pet.id, "pet created");
    store.pets.push(pet.clone());
    Ok(Json(pet))
}

async fn update_pet(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(input): Form<PetInput>,
) -> Result<Json<Pet>, Rejection> {
    let mut store = db.write().await;
    let user_id = authorize(&store, &headers)?;
    validate(&input)?;
    let pet = store
        .owned_pet_mut(&user_id, &id)
        .ok_or_else(|| not_found("Pet with this id wasn't found!"))?;
    if let Some(name) = input.name {
        pet.name = name;
    }
    if let Some(animal_type) = input.animal_type {
        pet.animal_type = animal_type;
    }
    if let Some(age) = input.age {
        pet.age = age;
    }
    Ok(Json(pet.clone()))
}

/// Answers 200 with an empty body, as the live service does.
async fn delete_pet(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> Result<StatusCode, Rejection> {
    let mut store = db.write().await;
    let user_id = authorize(&store, &headers)?;
    let before = store.pets.len();
    store.pets.retain(|p| !(p.id == id && p.user_id == user_id));
    if store.pets.len() == before {
        return Err(not_found("Pet with this id wasn't found!"));
    }
    tracing::debug!(pet_id = %id, "pet deleted");
    Ok(StatusCode::OK)
}

async fn set_photo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Pet>, Rejection> {
    let (_, photo) = read_multipart(multipart).await?;
    let photo = photo.ok_or_else(|| bad_request("Provide 'pet_photo' in form data"))?;
    let mut store = db.write().await;
    let user_id = authorize(&store, &headers)?;
    let pet = store
        .owned_pet_mut(&user_id, &id)
        .ok_or_else(|| not_found("Pet with this id wasn't found!"))?;
    pet.pet_photo = photo.data_url();
    Ok(Json(pet.clone()))
}

async fn read_multipart(mut multipart: Multipart) -> Result<(PetInput, Option<Photo>), Rejection> {
    let mut input = PetInput::default();
    let mut photo = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "pet_photo" {
            let content_type = field.content_type().unwrap_or("image/jpeg").to_string();
            let bytes = field.bytes().await.map_err(|e| bad_request(&e.body_text()))?;
            photo = Some(Photo {
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }
        let text = field.text().await.map_err(|e| bad_request(&e.body_text()))?;
        match name.as_str() {
            "name" => input.name = Some(text),
            "animal_type" => input.animal_type = Some(text),
            "age" => input.age = Some(text),
            _ => {}
        }
    }
    Ok((input, photo))
}

fn new_pet(user_id: &str, input: &PetInput, photo: Option<&Photo>) -> Result<Pet, Rejection> {
    validate(input)?;
    let required = |value: &Option<String>, field: &str| {
        value
            .clone()
            .ok_or_else(|| bad_request(&format!("Provide '{field}' in form data")))
    };
    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    Ok(Pet {
        id: Uuid::new_v4().to_string(),
        name: required(&input.name, "name")?,
        animal_type: required(&input.animal_type, "animal_type")?,
        age: required(&input.age, "age")?,
        pet_photo: photo.map(Photo::data_url).unwrap_or_default(),
        created_at: created_at.to_string(),
        user_id: user_id.to_string(),
    })
}

/// Checks the fields that are present.
pub fn validate(input: &PetInput) -> Result<(), Rejection> {
    if let Some(name) = &input.name {
        if name.trim().is_empty() || name.chars().count() > MAX_NAME_CHARS {
            return Err(bad_request("Name must be 1 to 80 characters long"));
        }
    }
    if let Some(animal_type) = &input.animal_type {
        if animal_type.trim().is_empty() || animal_type.chars().count() > MAX_NAME_CHARS {
            return Err(bad_request("Animal type must be 1 to 80 characters long"));
        }
        if !animal_type.chars().all(is_allowed_char) {
            return Err(bad_request("Animal type contains invalid characters"));
        }
    }
    if let Some(age) = &input.age {
        match age.trim().parse::<u32>() {
            Ok(_) => {}
            Err(_) => return Err(bad_request("Age must be a non-negative whole number")),
        }
    }
    Ok(())
}

/// Printable ASCII up to `z`, or the basic Cyrillic block `А`..`я`.
fn is_allowed_char(c: char) -> bool {
    (' '..='z').contains(&c) || ('А'..='я').contains(&c)
}

fn authorize(store: &Store, headers: &HeaderMap) -> Result<String, Rejection> {
    store
        .user_for_key(header(headers, "auth_key"))
        .map(|a| a.user_id.clone())
        .ok_or_else(|| forbidden("Please provide 'auth_key' Header"))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or_default()
}

fn forbidden(message: &str) -> Rejection {
    (StatusCode::FORBIDDEN, message.to_string())
}

fn bad_request(message: &str) -> Rejection {
    (StatusCode::BAD_REQUEST, message.to_string())
}

fn not_found(message: &str) -> Rejection {
    (StatusCode::NOT_FOUND, message.to_string())
}
