use sqlx::{Executor, Sqlite};

use cashtrack_core::{Category, CategoryId, CategoryRule, UserId};

use crate::db::DbPool;

pub async fn create_category<'e, E>(
    executor: E,
    user_id: UserId,
    name: &str,
) -> Result<Category, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let name = name.trim();
    let id: i64 =
        sqlx::query_scalar("INSERT INTO categories (user_id, name) VALUES (?, ?) RETURNING id")
            .bind(user_id.0)
            .bind(name)
            .fetch_one(executor)
            .await?;
    Ok(Category {
        id: CategoryId(id),
        user_id,
        name: name.to_string(),
    })
}

pub async fn list_categories<'e, E>(
    executor: E,
    user_id: UserId,
) -> Result<Vec<Category>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(i64, String)> =
        sqlx::query_as("SELECT id, name FROM categories WHERE user_id = ? ORDER BY name, id")
            .bind(user_id.0)
            .fetch_all(executor)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(id, name)| Category {
            id: CategoryId(id),
            user_id,
            name,
        })
        .collect())
}

/// Appends a rule after the user's current lowest-priority rule.
pub async fn create_category_rule<'e, E>(
    executor: E,
    user_id: UserId,
    category_id: CategoryId,
    needle: &str,
) -> Result<CategoryRule, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let (id, position): (i64, i64) = sqlx::query_as(
        "INSERT INTO category_rules (user_id, category_id, description_contains, position) \
         VALUES (?, ?, ?, (SELECT COALESCE(MAX(position), 0) + 1 FROM category_rules WHERE user_id = ?)) \
         RETURNING id, position",
    )
    .bind(user_id.0)
    .bind(category_id.0)
    .bind(needle)
    .bind(user_id.0)
    .fetch_one(executor)
    .await?;
    Ok(CategoryRule {
        id,
        user_id,
        category_id,
        needle: needle.to_string(),
        position,
    })
}

/// A user's rules in matching order.
pub async fn list_category_rules<'e, E>(
    executor: E,
    user_id: UserId,
) -> Result<Vec<CategoryRule>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(i64, i64, String, i64)> = sqlx::query_as(
        "SELECT id, category_id, description_contains, position FROM category_rules \
         WHERE user_id = ? ORDER BY position, id",
    )
    .bind(user_id.0)
    .fetch_all(executor)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, category_id, needle, position)| CategoryRule {
            id,
            user_id,
            category_id: CategoryId(category_id),
            needle,
            position,
        })
        .collect())
}

/// Gives the listed rules positions 1..=n in the order given. Ids that do not
/// belong to the user are ignored; rules left out keep their old position.
pub async fn reorder_category_rules(
    pool: &DbPool,
    user_id: UserId,
    ordered_ids: &[i64],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for (index, rule_id) in ordered_ids.iter().enumerate() {
        let position = index as i64 + 1;
        sqlx::query("UPDATE category_rules SET position = ? WHERE id = ? AND user_id = ?")
            .bind(position)
            .bind(rule_id)
            .bind(user_id.0)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    tracing::debug!(user_id = user_id.0, rules = ordered_ids.len(), "reordered category rules");
    Ok(())
}

pub async fn delete_category_rule<'e, E>(
    executor: E,
    user_id: UserId,
    rule_id: i64,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM category_rules WHERE id = ? AND user_id = ?")
        .bind(rule_id)
        .bind(user_id.0)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_db;

    #[tokio::test]
    async fn rules_append_in_creation_order() {
        let (_dir, pool) = temp_db().await;
        let user = UserId(1);
        let travel = create_category(&pool, user, " Travel ").await.unwrap();
        assert_eq!(travel.name, "Travel");

        let first = create_category_rule(&pool, user, travel.id, "uber").await.unwrap();
        let second = create_category_rule(&pool, user, travel.id, "sbb").await.unwrap();
        let other_user = create_category_rule(&pool, UserId(2), travel.id, "x").await.unwrap();
        assert_eq!(first.position, 1);
        assert_eq!(second.position, 2);
        assert_eq!(other_user.position, 1);

        let rules = list_category_rules(&pool, user).await.unwrap();
        let needles: Vec<_> = rules.iter().map(|r| r.needle.as_str()).collect();
        assert_eq!(needles, vec!["uber", "sbb"]);
    }

    #[tokio::test]
    async fn reorder_changes_matching_order() {
        let (_dir, pool) = temp_db().await;
        let user = UserId(1);
        let food = create_category(&pool, user, "Food").await.unwrap();
        let a = create_category_rule(&pool, user, food.id, "coop").await.unwrap();
        let b = create_category_rule(&pool, user, food.id, "migros").await.unwrap();
        let c = create_category_rule(&pool, user, food.id, "denner").await.unwrap();
        let foreign = create_category_rule(&pool, UserId(2), food.id, "lidl").await.unwrap();

        reorder_category_rules(&pool, user, &[c.id, a.id, b.id, foreign.id]).await.unwrap();

        let rules = list_category_rules(&pool, user).await.unwrap();
        assert_eq!(rules.iter().map(|r| r.id).collect::<Vec<_>>(), vec![c.id, a.id, b.id]);
        assert_eq!(rules.iter().map(|r| r.position).collect::<Vec<_>>(), vec![1, 2, 3]);
        let untouched = list_category_rules(&pool, UserId(2)).await.unwrap();
        assert_eq!(untouched[0].position, 1);

        assert_eq!(delete_category_rule(&pool, user, a.id).await.unwrap(), 1);
        assert_eq!(list_category_rules(&pool, user).await.unwrap().len(), 2);
        assert_eq!(list_categories(&pool, user).await.unwrap(), vec![food]);
    }
}
