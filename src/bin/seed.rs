use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{products, users},
    middleware::auth::{ROLE_ADMIN, ROLE_USER},
    models::{FragranceNotes, ProductCategory},
    services::auth_service::hash_password,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "Store Admin", "admin1234", ROLE_ADMIN).await?;
    let user_id = ensure_user(&orm, "user@example.com", "Sample Customer", "user1234", ROLE_USER).await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<i32> {
    let existing = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?;
    if let Some(user) = existing {
        if user.role != role {
            let mut active: users::ActiveModel = user.into();
            active.role = Set(role.to_string());
            let user = active.update(orm).await?;
            println!("Updated role of {email} to {role}");
            return Ok(user.id);
        }
        return Ok(user.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = users::ActiveModel {
        id: NotSet,
        email: Set(email.to_string()),
        name: Set(name.to_string()),
        phone: Set(None),
        password_hash: Set(password_hash),
        role: Set(role.to_string()),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user.id)
}

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    category: ProductCategory,
    price: i64,
    discount_price: Option<i64>,
    sizes: &'static [&'static str],
    notes: (&'static [&'static str], &'static [&'static str], &'static [&'static str]),
    stock: i32,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let catalog = [
        SeedProduct {
            name: "Oud Royal",
            description: "Smoky oud over a leather base",
            category: ProductCategory::Men,
            price: 90,
            discount_price: Some(75),
            sizes: &["30ml", "50ml", "100ml"],
            notes: (&["saffron"], &["oud", "rose"], &["leather", "amber"]),
            stock: 40,
        },
        SeedProduct {
            name: "Jasmin de Nuit",
            description: "White florals for the evening",
            category: ProductCategory::Women,
            price: 85,
            discount_price: None,
            sizes: &["30ml", "50ml"],
            notes: (&["bergamot"], &["jasmine", "tuberose"], &["musk"]),
            stock: 60,
        },
        SeedProduct {
            name: "Citrus Breeze",
            description: "Fresh everyday citrus",
            category: ProductCategory::Unisex,
            price: 60,
            discount_price: None,
            sizes: &["50ml", "100ml"],
            notes: (&["lemon", "grapefruit"], &["neroli"], &["vetiver"]),
            stock: 80,
        },
        SeedProduct {
            name: "Discovery Pack",
            description: "Five 10ml samples from the collection",
            category: ProductCategory::Pack,
            price: 45,
            discount_price: Some(39),
            sizes: &[],
            notes: (&[], &[], &[]),
            stock: 25,
        },
    ];

    for item in catalog {
        let exists = products::Entity::find()
            .filter(products::Column::Name.eq(item.name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        let (top, heart, base) = item.notes;
        let notes = (!top.is_empty()).then(|| FragranceNotes {
            top: strings(top),
            heart: strings(heart),
            base: strings(base),
        });

        products::ActiveModel {
            id: NotSet,
            name: Set(item.name.to_string()),
            description: Set(Some(item.description.to_string())),
            category: Set(item.category),
            price: Set(Decimal::from(item.price)),
            discount_price: Set(item.discount_price.map(Decimal::from)),
            image: Set(None),
            images: Set(Vec::new()),
            sizes: Set(strings(item.sizes)),
            notes: Set(notes),
            stock: Set(item.stock),
            is_active: Set(true),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
