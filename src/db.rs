use std::{str::FromStr, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    QueryBuilder, Sqlite,
};

use crate::data::{Dish, Restaurant};

/// Boolean-like columns may hold `1`/`0` or the text `'true'`/`'false'`.
/// Both read back as the integer 1 or 0.
fn flag(column: &str) -> String {
    format!("CASE WHEN lower({column}) IN ('1', 'true') THEN 1 ELSE 0 END")
}

fn restaurant_columns() -> String {
    format!(
        "id, name, cuisine, {} AS isVeg, rating, priceForTwo, location, \
         {} AS hasOutdoorSeating, {} AS isLuxury",
        flag("isVeg"),
        flag("hasOutdoorSeating"),
        flag("isLuxury"),
    )
}

fn dish_columns() -> String {
    format!("id, name, price, rating, {} AS isVeg", flag("isVeg"))
}

/// Open the shared pool. It holds exactly one connection, which is never
/// recycled, so `sqlite::memory:` databases keep their content.
pub async fn connect(url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid database url {url}"))?
        .create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await
        .with_context(|| format!("fail to open database {url}"))
}

/// Create both tables when they are missing. Existing tables are left alone.
pub async fn init_schema(db_conn: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS restaurants (
    id                INTEGER PRIMARY KEY,
    name              TEXT    NOT NULL,
    cuisine           TEXT    NOT NULL,
    isVeg             BOOLEAN NOT NULL,
    rating            REAL    NOT NULL,
    priceForTwo       INTEGER NOT NULL,
    location          TEXT    NOT NULL,
    hasOutdoorSeating BOOLEAN NOT NULL,
    isLuxury          BOOLEAN NOT NULL
)"#,
    )
    .execute(db_conn)
    .await
    .context("fail to create restaurants table")?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS dishes (
    id     INTEGER PRIMARY KEY,
    name   TEXT    NOT NULL,
    price  REAL    NOT NULL,
    rating REAL    NOT NULL,
    isVeg  BOOLEAN NOT NULL
)"#,
    )
    .execute(db_conn)
    .await
    .context("fail to create dishes table")?;

    Ok(())
}

/// Optional restaurant filters. Every field that is set narrows the result,
/// unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantFilter {
    pub is_veg: Option<bool>,
    pub has_outdoor_seating: Option<bool>,
    pub is_luxury: Option<bool>,
}

#[derive(Debug, Clone)]
pub enum RestaurantSearchProps {
    All,
    Id(i64),
    Cuisine(String),
    Filter(RestaurantFilter),
    SortByRating,
}

impl RestaurantSearchProps {
    fn into_query(self) -> QueryBuilder<'static, Sqlite> {
        let mut query =
            QueryBuilder::new(format!("SELECT {} FROM restaurants", restaurant_columns()));
        match self {
            Self::All => {
                query.push(" ORDER BY id");
            }
            Self::Id(id) => {
                query.push(" WHERE id = ").push_bind(id);
            }
            Self::Cuisine(cuisine) => {
                query
                    .push(" WHERE cuisine = ")
                    .push_bind(cuisine)
                    .push(" ORDER BY id");
            }
            Self::Filter(filter) => {
                query.push(" WHERE 1=1");
                if let Some(is_veg) = filter.is_veg {
                    query
                        .push(format!(" AND {} = ", flag("isVeg")))
                        .push_bind(is_veg);
                }
                if let Some(outdoor) = filter.has_outdoor_seating {
                    query
                        .push(format!(" AND {} = ", flag("hasOutdoorSeating")))
                        .push_bind(outdoor);
                }
                if let Some(luxury) = filter.is_luxury {
                    query
                        .push(format!(" AND {} = ", flag("isLuxury")))
                        .push_bind(luxury);
                }
                query.push(" ORDER BY id");
            }
            Self::SortByRating => {
                query.push(" ORDER BY rating DESC, id");
            }
        }
        query
    }
}

pub async fn get_restaurant(
    db_conn: &SqlitePool,
    props: RestaurantSearchProps,
) -> anyhow::Result<Vec<Restaurant>> {
    tracing::debug!(?props, "querying restaurants");
    let mut query = props.into_query();
    let rows = query
        .build_query_as::<Restaurant>()
        .fetch_all(db_conn)
        .await
        .context("fail to get restaurants")?;
    Ok(rows)
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DishFilter {
    pub is_veg: Option<bool>,
}

#[derive(Debug, Clone)]
pub enum DishSearchProps {
    All,
    Id(i64),
    Filter(DishFilter),
    SortByPrice,
}

impl DishSearchProps {
    fn into_query(self) -> QueryBuilder<'static, Sqlite> {
        let mut query = QueryBuilder::new(format!("SELECT {} FROM dishes", dish_columns()));
        match self {
            Self::All => {
                query.push(" ORDER BY id");
            }
            Self::Id(id) => {
                query.push(" WHERE id = ").push_bind(id);
            }
            Self::Filter(filter) => {
                query.push(" WHERE 1=1");
                if let Some(is_veg) = filter.is_veg {
                    query
                        .push(format!(" AND {} = ", flag("isVeg")))
                        .push_bind(is_veg);
                }
                query.push(" ORDER BY id");
            }
            Self::SortByPrice => {
                query.push(" ORDER BY price ASC, id");
            }
        }
        query
    }
}

pub async fn get_dish(db_conn: &SqlitePool, props: DishSearchProps) -> anyhow::Result<Vec<Dish>> {
    tracing::debug!(?props, "querying dishes");
    let mut query = props.into_query();
    let rows = query
        .build_query_as::<Dish>()
        .fetch_all(db_conn)
        .await
        .context("fail to get dishes")?;
    Ok(rows)
}
