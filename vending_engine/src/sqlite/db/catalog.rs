use sqlx::SqliteConnection;

use crate::{
    db_types::{Member, Product},
    traits::{NewMember, NewProduct, StoreError},
};

pub async fn insert_member(member: NewMember, conn: &mut SqliteConnection) -> Result<Member, StoreError> {
    let member = sqlx::query_as("INSERT INTO members (nickname, mobile) VALUES ($1, $2) RETURNING *;")
        .bind(member.nickname)
        .bind(member.mobile)
        .fetch_one(conn)
        .await?;
    Ok(member)
}

pub async fn fetch_member(id: i64, conn: &mut SqliteConnection) -> Result<Option<Member>, sqlx::Error> {
    let member = sqlx::query_as("SELECT * FROM members WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(member)
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, StoreError> {
    let product = sqlx::query_as("INSERT INTO products (name, price) VALUES ($1, $2) RETURNING *;")
        .bind(product.name)
        .bind(product.price)
        .fetch_one(conn)
        .await?;
    Ok(product)
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}
