use uuid::Uuid;

use crate::credentials::{hash_password_with, PBKDF2_ITERATIONS};
use crate::db::models::{Role, User};
use crate::store::{StoreResult, UserStore};

struct SeedUser {
    name: &'static str,
    email: &'static str,
    password: &'static str,
    role: Role,
}

fn get_seed_users() -> Vec<SeedUser> {
    vec![
        SeedUser {
            name: "Dr. Strange",
            email: "doc@example.com",
            password: "doc123",
            role: Role::Doctor,
        },
        SeedUser {
            name: "Receptionist Amy",
            email: "reception@example.com",
            password: "recep123",
            role: Role::Receptionist,
        },
    ]
}

/// Provisions the demo doctor and receptionist. Existing emails are left alone.
pub async fn seed_users(store: &impl UserStore) -> StoreResult<usize> {
    seed_users_with(store, PBKDF2_ITERATIONS).await
}

pub async fn seed_users_with(store: &impl UserStore, iterations: u32) -> StoreResult<usize> {
    let mut inserted = 0;
    for seed in get_seed_users() {
        if store.find_user_by_email(seed.email).await?.is_some() {
            log::debug!("User {} already present, skipping", seed.email);
            continue;
        }

        let user = User {
            id: Uuid::new_v4(),
            name: seed.name.to_string(),
            email: seed.email.to_string(),
            role: seed.role,
            password_hash: hash_password_with(seed.password, iterations),
        };

        // insert_user skips an email that appeared since the lookup.
        if store.insert_user(&user).await? {
            log::info!("Seeded {} {}", user.role, user.email);
            inserted += 1;
        }
    }
    Ok(inserted)
}
