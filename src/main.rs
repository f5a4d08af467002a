mod error;
mod model;

use actix_web::{HttpResponse, get, post, web};
use error::ApiError;
use model::User;
use mongodb::{
    Client, Collection, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use shuttle_actix_web::ShuttleActixWeb;
use shuttle_runtime::SecretStore;
use shuttle_runtime::__internals::Context;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const DB_NAME: &str = "bookkeeping";
const COLL_NAME: &str = "users";

fn users(client: &Client) -> Collection<User> {
    client.database(DB_NAME).collection(COLL_NAME)
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "user",
    request_body = User,
    responses(
        (status = 201, description = "User added", body = User),
        (status = 400, description = "Malformed user"),
        (status = 409, description = "id or externalId already taken"),
        (status = 500, description = "Internal Server Error")
    )
)]
#[post("/api/users")]
async fn add_user(
    client: web::Data<Client>,
    user: web::Json<User>,
) -> Result<HttpResponse, ApiError> {
    let user = user.into_inner();
    users(&client)
        .insert_one(&user)
        .await
        .map_err(ApiError::from)
        .inspect_err(|err| {
            if matches!(err, ApiError::Conflict) {
                tracing::warn!(id = user.id, external_id = user.external_id, "duplicate user");
            }
        })?;
    tracing::info!(id = user.id, external_id = user.external_id, "user added");
    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "user",
    responses(
        (status = 200, description = "All users ordered by id", body = [User]),
        (status = 500, description = "Internal Server Error")
    )
)]
#[get("/api/users")]
async fn list_users(client: web::Data<Client>) -> Result<HttpResponse, ApiError> {
    let mut cursor = users(&client).find(doc! {}).sort(doc! { "id": 1 }).await?;
    let mut found = Vec::new();
    while cursor.advance().await? {
        found.push(cursor.deserialize_current()?);
    }
    Ok(HttpResponse::Ok().json(found))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "user",
    params(
        ("id" = i64, Path, description = "The internal identifier to lookup")
    ),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal Server Error")
    )
)]
#[get("/api/users/{id}")]
async fn get_user(
    client: web::Data<Client>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    match users(&client).find_one(doc! { "id": id }).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(ApiError::NotFound {
            field: "id",
            value: id,
        }),
    }
}

#[utoipa::path(
    get,
    path = "/api/users/external/{external_id}",
    tag = "user",
    params(
        ("external_id" = i64, Path, description = "The CERN identifier to lookup")
    ),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal Server Error")
    )
)]
#[get("/api/users/external/{external_id}")]
async fn get_user_by_external_id(
    client: web::Data<Client>,
    external_id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let external_id = external_id.into_inner();
    match users(&client)
        .find_one(doc! { "externalId": external_id })
        .await?
    {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(ApiError::NotFound {
            field: "externalId",
            value: external_id,
        }),
    }
}

async fn create_unique_index(client: &Client, key: &str) -> mongodb::error::Result<()> {
    let mut keys = Document::new();
    keys.insert(key, 1);
    let options = IndexOptions::builder().unique(true).build();
    let model = IndexModel::builder().keys(keys).options(options).build();
    users(client).create_index(model).await?;
    Ok(())
}

fn configure_api(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into());
    cfg.app_data(json_config)
        .service(add_user)
        .service(list_users)
        .service(get_user_by_external_id)
        .service(get_user);
}

#[derive(OpenApi)]
#[openapi(
    paths(add_user, list_users, get_user, get_user_by_external_id),
    components(schemas(User)),
    tags(
        (name = "user", description = "Bookkeeping users API")
    )
)]
struct ApiDoc;

#[shuttle_runtime::main]
async fn main(
    #[shuttle_runtime::Secrets] secrets: SecretStore,
) -> ShuttleActixWeb<impl FnOnce(&mut web::ServiceConfig) + Send + Clone + 'static> {
    let mongodb_uri = secrets.get("MONGODB_URI").context("secret was not found")?;
    let client = Client::with_uri_str(&mongodb_uri)
        .await
        .context("connecting to MongoDB")?;

    for key in ["id", "externalId"] {
        create_unique_index(&client, key)
            .await
            .with_context(|| format!("creating unique index on {key}"))?;
    }
    tracing::info!(database = DB_NAME, collection = COLL_NAME, "user indexes ready");

    let client_data = web::Data::new(client);

    let config = move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(client_data.clone())
            .configure(configure_api)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            );
    };

    Ok(config.into())
}
