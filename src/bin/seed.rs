use little_lemon_api::{
    config::AppConfig,
    db::{OrmConn, create_pool, orm_from_pool, run_migrations},
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        groups::{DELIVERY_CREW, MANAGER},
        menu_items::{ActiveModel as MenuItemActive, Column as MenuItemCol, Entity as MenuItems},
        user_groups::{ActiveModel as UserGroupActive, Column as UserGroupCol, Entity as UserGroups},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    services::auth_service::hash_password,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

struct SeedUser<'a> {
    username: &'a str,
    password: &'a str,
    is_staff: bool,
    is_superuser: bool,
    groups: &'a [&'a str],
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;
    let orm = orm_from_pool(pool);

    let users = [
        SeedUser {
            username: "admin",
            password: "admin123",
            is_staff: true,
            is_superuser: true,
            groups: &[MANAGER],
        },
        SeedUser {
            username: "rider",
            password: "rider123",
            is_staff: false,
            is_superuser: false,
            groups: &[DELIVERY_CREW],
        },
        SeedUser {
            username: "guest",
            password: "guest123",
            is_staff: false,
            is_superuser: false,
            groups: &[],
        },
    ];
    for user in &users {
        let id = ensure_user(&orm, user).await?;
        println!("Ensured user {} ({id})", user.username);
    }

    seed_menu(&orm).await?;

    println!("Seed completed");
    Ok(())
}

async fn ensure_user(orm: &OrmConn, seed: &SeedUser<'_>) -> anyhow::Result<Uuid> {
    let existing = Users::find()
        .filter(UserCol::Username.eq(seed.username))
        .one(orm)
        .await?;

    let id = match existing {
        Some(user) => user.id,
        None => {
            let password_hash = hash_password(seed.password)?;
            UserActive {
                id: Set(Uuid::new_v4()),
                username: Set(seed.username.to_string()),
                email: Set(format!("{}@littlelemon.test", seed.username)),
                password_hash: Set(password_hash),
                is_staff: Set(seed.is_staff),
                is_superuser: Set(seed.is_superuser),
                created_at: NotSet,
            }
            .insert(orm)
            .await?
            .id
        }
    };

    for group in seed.groups {
        UserGroups::insert(UserGroupActive {
            user_id: Set(id),
            group_name: Set(group.to_string()),
        })
        .on_conflict(
            OnConflict::columns([UserGroupCol::UserId, UserGroupCol::GroupName])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(orm)
        .await?;
    }

    Ok(id)
}

async fn seed_menu(orm: &OrmConn) -> anyhow::Result<()> {
    let menu = [
        ("Mains", "Burger", 500),
        ("Mains", "Grilled Fish", 1250),
        ("Sides", "Fries", 250),
        ("Sides", "Greek Salad", 675),
        ("Desserts", "Lemon Cake", 450),
    ];

    for (category_title, title, price) in menu {
        let category = match Categories::find()
            .filter(CategoryCol::Title.eq(category_title))
            .one(orm)
            .await?
        {
            Some(c) => c,
            None => {
                CategoryActive {
                    id: Set(Uuid::new_v4()),
                    title: Set(category_title.to_string()),
                }
                .insert(orm)
                .await?
            }
        };

        let exists = MenuItems::find()
            .filter(MenuItemCol::Title.eq(title))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        MenuItemActive {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            price: Set(price),
            featured: Set(false),
            category_id: Set(category.id),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded menu");
    Ok(())
}
