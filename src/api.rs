use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::{
    data::{Dish, Restaurant},
    db as db_api,
    error::ApiError,
};

pub struct ApiState {
    db_pool: sqlx::SqlitePool,
}

impl ApiState {
    pub fn new(db_pool: sqlx::SqlitePool) -> Self {
        Self { db_pool }
    }

    async fn restaurants(
        &self,
        props: db_api::RestaurantSearchProps,
    ) -> Result<Vec<Restaurant>, ApiError> {
        db_api::get_restaurant(&self.db_pool, props)
            .await
            .map_err(log_failure)
    }

    async fn dishes(&self, props: db_api::DishSearchProps) -> Result<Vec<Dish>, ApiError> {
        db_api::get_dish(&self.db_pool, props)
            .await
            .map_err(log_failure)
    }
}

fn log_failure(err: anyhow::Error) -> ApiError {
    tracing::error!("database query failed: {err:#}");
    ApiError::Database(err)
}

/// Register every route on an actix `App` or scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_restaurants)
        .service(restaurant_details)
        .service(restaurants_by_cuisine)
        .service(restaurants_filter)
        .service(restaurants_sort_by_rating)
        .service(get_dishes)
        .service(dish_details)
        .service(dishes_filter)
        .service(dishes_sort_by_price);
}

#[derive(Serialize)]
struct RestaurantsResp {
    restaurants: Vec<Restaurant>,
}

#[derive(Serialize)]
struct RestaurantResp {
    restaurant: Restaurant,
}

#[derive(Serialize)]
struct DishesResp {
    dishes: Vec<Dish>,
}

#[derive(Serialize)]
struct DishResp {
    dish: Dish,
}

#[derive(Deserialize)]
struct IdPath {
    id: i64,
}

#[derive(Deserialize)]
struct CuisinePath {
    cuisine: String,
}

#[actix_web::get("/restaurants")]
async fn get_restaurants(data: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    let restaurants = data
        .restaurants(db_api::RestaurantSearchProps::All)
        .await?;
    Ok(HttpResponse::Ok().json(RestaurantsResp { restaurants }))
}

#[actix_web::get("/restaurants/details/{id}")]
async fn restaurant_details(
    data: web::Data<ApiState>,
    path: web::Path<IdPath>,
) -> Result<HttpResponse, ApiError> {
    let restaurant = data
        .restaurants(db_api::RestaurantSearchProps::Id(path.id))
        .await?
        .into_iter()
        .next()
        .ok_or(ApiError::NotFound("Restaurant"))?;
    Ok(HttpResponse::Ok().json(RestaurantResp { restaurant }))
}

#[actix_web::get("/restaurants/cuisine/{cuisine}")]
async fn restaurants_by_cuisine(
    data: web::Data<ApiState>,
    path: web::Path<CuisinePath>,
) -> Result<HttpResponse, ApiError> {
    let CuisinePath { cuisine } = path.into_inner();
    let restaurants = data
        .restaurants(db_api::RestaurantSearchProps::Cuisine(cuisine))
        .await?;
    Ok(HttpResponse::Ok().json(RestaurantsResp { restaurants }))
}

#[actix_web::get("/restaurants/filter")]
async fn restaurants_filter(
    data: web::Data<ApiState>,
    query: web::Query<db_api::RestaurantFilter>,
) -> Result<HttpResponse, ApiError> {
    let restaurants = data
        .restaurants(db_api::RestaurantSearchProps::Filter(query.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(RestaurantsResp { restaurants }))
}

#[actix_web::get("/restaurants/sort-by-rating")]
async fn restaurants_sort_by_rating(data: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    let restaurants = data
        .restaurants(db_api::RestaurantSearchProps::SortByRating)
        .await?;
    Ok(HttpResponse::Ok().json(RestaurantsResp { restaurants }))
}

#[actix_web::get("/dishes")]
async fn get_dishes(data: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    let dishes = data.dishes(db_api::DishSearchProps::All).await?;
    Ok(HttpResponse::Ok().json(DishesResp { dishes }))
}

#[actix_web::get("/dishes/details/{id}")]
async fn dish_details(
    data: web::Data<ApiState>,
    path: web::Path<IdPath>,
) -> Result<HttpResponse, ApiError> {
    let dish = data
        .dishes(db_api::DishSearchProps::Id(path.id))
        .await?
        .into_iter()
        .next()
        .ok_or(ApiError::NotFound("Dish"))?;
    Ok(HttpResponse::Ok().json(DishResp { dish }))
}

#[actix_web::get("/dishes/filter")]
async fn dishes_filter(
    data: web::Data<ApiState>,
    query: web::Query<db_api::DishFilter>,
) -> Result<HttpResponse, ApiError> {
    let dishes = data
        .dishes(db_api::DishSearchProps::Filter(query.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(DishesResp { dishes }))
}

#[actix_web::get("/dishes/sort-by-price")]
async fn dishes_sort_by_price(data: web::Data<ApiState>) -> Result<HttpResponse, ApiError> {
    let dishes = data.dishes(db_api::DishSearchProps::SortByPrice).await?;
    Ok(HttpResponse::Ok().json(DishesResp { dishes }))
}

#[cfg(test)]
mod tests {
    use actix_web::{dev::ServiceResponse, http::StatusCode, test, App};
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    use super::*;
    use crate::db::fixture::{empty_pool, seeded_pool, text_flag_pool};

    async fn get(pool: SqlitePool, uri: &str) -> ServiceResponse {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ApiState::new(pool)))
                .configure(configure),
        )
        .await;
        test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await
    }

    async fn get_json(pool: SqlitePool, uri: &str) -> (StatusCode, Value) {
        let resp = get(pool, uri).await;
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    fn ids(list: &Value) -> Vec<i64> {
        list.as_array()
            .unwrap()
            .iter()
            .map(|row| row["id"].as_i64().unwrap())
            .collect()
    }

    #[actix_web::test]
    async fn test_list_restaurants() {
        let (status, body) = get_json(seeded_pool().await, "/restaurants").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body["restaurants"]), vec![1, 2, 3, 4, 5]);
        assert_eq!(
            body["restaurants"][0],
            json!({
                "id": 1,
                "name": "Spice Garden",
                "cuisine": "Indian",
                "isVeg": true,
                "rating": 4.5,
                "priceForTwo": 1500,
                "location": "Koramangala",
                "hasOutdoorSeating": true,
                "isLuxury": false
            })
        );
    }

    #[actix_web::test]
    async fn test_restaurant_details() {
        let (status, body) = get_json(seeded_pool().await, "/restaurants/details/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["restaurant"]["name"], "Olive Bistro");
    }

    #[actix_web::test]
    async fn test_restaurant_details_on_empty_table() {
        let (status, body) = get_json(empty_pool().await, "/restaurants/details/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Restaurant not found" }));
    }

    #[actix_web::test]
    async fn test_non_numeric_id_is_not_found() {
        let resp = get(seeded_pool().await, "/dishes/details/abc").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_restaurants_by_cuisine() {
        let (status, body) = get_json(seeded_pool().await, "/restaurants/cuisine/Indian").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body["restaurants"]), vec![1, 5]);

        let (_, body) = get_json(seeded_pool().await, "/restaurants/cuisine/Thai").await;
        assert_eq!(body, json!({ "restaurants": [] }));
    }

    #[actix_web::test]
    async fn test_filter_veg_restaurants() {
        let (status, body) = get_json(seeded_pool().await, "/restaurants/filter?isVeg=true").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["restaurants"].as_array().unwrap();
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|row| row["isVeg"] == json!(true)));
    }

    #[actix_web::test]
    async fn test_filter_combines_conditions() {
        let (_, body) = get_json(
            seeded_pool().await,
            "/restaurants/filter?hasOutdoorSeating=true&isLuxury=true",
        )
        .await;
        assert_eq!(ids(&body["restaurants"]), vec![4, 5]);

        let (_, body) = get_json(seeded_pool().await, "/restaurants/filter").await;
        assert_eq!(ids(&body["restaurants"]), vec![1, 2, 3, 4, 5]);
    }

    #[actix_web::test]
    async fn test_text_boolean_columns() {
        let (status, body) = get_json(text_flag_pool().await, "/restaurants").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["restaurants"][0]["isVeg"], json!(true));
        assert_eq!(body["restaurants"][1]["isVeg"], json!(false));

        let (status, body) =
            get_json(text_flag_pool().await, "/restaurants/filter?isVeg=true").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body["restaurants"]), vec![1]);

        let (_, body) = get_json(text_flag_pool().await, "/dishes/filter?isVeg=true").await;
        assert_eq!(ids(&body["dishes"]), vec![1]);
    }

    #[actix_web::test]
    async fn test_filter_rejects_non_boolean() {
        let resp = get(seeded_pool().await, "/restaurants/filter?isVeg=maybe").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_restaurants_sort_by_rating() {
        let (_, body) = get_json(seeded_pool().await, "/restaurants/sort-by-rating").await;
        let ratings: Vec<f64> = body["restaurants"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["rating"].as_f64().unwrap())
            .collect();
        assert_eq!(ratings.len(), 5);
        assert!(ratings.windows(2).all(|w| w[0] >= w[1]));
    }

    #[actix_web::test]
    async fn test_dishes_endpoints() {
        let (status, body) = get_json(seeded_pool().await, "/dishes").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body["dishes"]), vec![1, 2, 3, 4, 5]);

        let (_, body) = get_json(seeded_pool().await, "/dishes/details/3").await;
        assert_eq!(
            body,
            json!({
                "dish": { "id": 3, "name": "Veg Biryani", "price": 180.0, "rating": 4.3, "isVeg": true }
            })
        );

        let (status, body) = get_json(seeded_pool().await, "/dishes/details/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Dish not found");

        let (_, body) = get_json(seeded_pool().await, "/dishes/filter?isVeg=false").await;
        assert_eq!(ids(&body["dishes"]), vec![2, 4]);
    }

    #[actix_web::test]
    async fn test_dishes_sort_by_price() {
        let (status, body) = get_json(seeded_pool().await, "/dishes/sort-by-price").await;
        assert_eq!(status, StatusCode::OK);
        let prices: Vec<f64> = body["dishes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|row| row["price"].as_f64().unwrap())
            .collect();
        assert_eq!(prices.len(), 5);
        assert!(prices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[actix_web::test]
    async fn test_database_failure_is_500() {
        // no schema: every query hits a missing table
        let pool = db_api::connect("sqlite::memory:").await.unwrap();
        let (status, body) = get_json(pool, "/restaurants").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("fail to get restaurants"));
        assert!(message.contains("no such table"));
    }
}
