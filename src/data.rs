use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub cuisine: String,
    pub is_veg: bool,
    pub rating: f64,
    pub price_for_two: i64,
    pub location: String,
    pub has_outdoor_seating: bool,
    pub is_luxury: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Dish {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub rating: f64,
    pub is_veg: bool,
}
