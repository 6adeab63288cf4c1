//! Package repository: equipment-category associations and the package views
//! assembled from them

use super::{equipment::CATEGORY_EQUIPMENT_SQL, Repository};
use crate::{
    db::{validate::Payload, AffectedRows, Executor},
    error::{AppError, AppResult, LogNeutral},
    models::{
        category::Category,
        equipment::{Equipment, PackagedEquipment},
        package::{
            CategoryMembership, EquipmentCategory, PackageCompatibility, PackageDetails, PackageItem,
        },
    },
};

fn ensure_positive_quantity(quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::Validation(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PackagesRepository {
    db: Executor,
}

impl PackagesRepository {
    pub fn new(db: Executor) -> Self {
        Self { db }
    }

    /// Add equipment to a package, or update quantity and flag when the pair
    /// already exists
    pub async fn add_equipment_to_category(
        &self,
        equipment_id: i32,
        category_id: i32,
        quantity: i32,
        required: bool,
    ) -> bool {
        let added = self
            .upsert(equipment_id, category_id, quantity, required)
            .await
            .or_neutral(format_args!(
                "Error adding equipment {} to category {}",
                equipment_id, category_id
            ));
        if added {
            tracing::info!(
                "Equipment {} linked to category {} (qty {}, required {})",
                equipment_id,
                category_id,
                quantity,
                required
            );
        }
        added
    }

    async fn upsert(
        &self,
        equipment_id: i32,
        category_id: i32,
        quantity: i32,
        required: bool,
    ) -> AppResult<bool> {
        ensure_positive_quantity(quantity)?;
        self.db
            .execute(
                r#"
                INSERT INTO equipment_categories (equipment_id, category_id, quantity_in_package, is_required)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (equipment_id, category_id) DO UPDATE
                SET quantity_in_package = EXCLUDED.quantity_in_package,
                    is_required = EXCLUDED.is_required
                "#,
                &[
                    equipment_id.into(),
                    category_id.into(),
                    quantity.into(),
                    required.into(),
                ],
            )
            .await
            .affected_any()
    }

    /// The association row for one pair, if any
    pub async fn get_association(&self, equipment_id: i32, category_id: i32) -> Option<EquipmentCategory> {
        self.db
            .fetch_optional(
                "SELECT * FROM equipment_categories WHERE equipment_id = $1 AND category_id = $2",
                &[equipment_id.into(), category_id.into()],
            )
            .await
            .or_neutral(format_args!(
                "Error retrieving association of equipment {} and category {}",
                equipment_id, category_id
            ))
    }

    pub async fn remove_equipment_from_category(&self, equipment_id: i32, category_id: i32) -> bool {
        self.db
            .execute(
                "DELETE FROM equipment_categories WHERE equipment_id = $1 AND category_id = $2",
                &[equipment_id.into(), category_id.into()],
            )
            .await
            .affected_any()
            .or_neutral(format_args!(
                "Error removing equipment {} from category {}",
                equipment_id, category_id
            ))
    }

    /// Change the quantity of an item in a package; non-positive quantities are rejected
    pub async fn update_package_quantity(
        &self,
        equipment_id: i32,
        category_id: i32,
        quantity: i32,
    ) -> bool {
        self.set_quantity(equipment_id, category_id, quantity)
            .await
            .or_neutral(format_args!(
                "Error updating quantity of equipment {} in category {}",
                equipment_id, category_id
            ))
    }

    async fn set_quantity(&self, equipment_id: i32, category_id: i32, quantity: i32) -> AppResult<bool> {
        ensure_positive_quantity(quantity)?;
        self.db
            .execute(
                r#"
                UPDATE equipment_categories SET quantity_in_package = $1
                WHERE equipment_id = $2 AND category_id = $3
                "#,
                &[quantity.into(), equipment_id.into(), category_id.into()],
            )
            .await
            .affected_any()
    }

    pub async fn update_package_requirement(
        &self,
        equipment_id: i32,
        category_id: i32,
        required: bool,
    ) -> bool {
        self.db
            .execute(
                r#"
                UPDATE equipment_categories SET is_required = $1
                WHERE equipment_id = $2 AND category_id = $3
                "#,
                &[required.into(), equipment_id.into(), category_id.into()],
            )
            .await
            .affected_any()
            .or_neutral(format_args!(
                "Error updating requirement of equipment {} in category {}",
                equipment_id, category_id
            ))
    }

    /// Category, its equipment and derived statistics; `None` when the
    /// category does not exist
    pub async fn get_package_details(&self, category_id: i32) -> Option<PackageDetails> {
        self.load_package(category_id)
            .await
            .or_neutral(format_args!("Error retrieving package details for category {}", category_id))
    }

    async fn load_package(&self, category_id: i32) -> AppResult<Option<PackageDetails>> {
        let Some(category) = self
            .db
            .fetch_optional::<Category>("SELECT * FROM categories WHERE id = $1", &[category_id.into()])
            .await?
        else {
            return Ok(None);
        };

        let equipment: Vec<PackagedEquipment> = self
            .db
            .fetch_all(CATEGORY_EQUIPMENT_SQL, &[category_id.into()])
            .await?;

        Ok(Some(PackageDetails::new(category, equipment)))
    }

    /// Every package an item belongs to, alphabetical by category name
    pub async fn get_equipment_categories(&self, equipment_id: i32) -> Vec<CategoryMembership> {
        self.memberships(equipment_id)
            .await
            .or_neutral(format_args!("Error retrieving categories for equipment {}", equipment_id))
    }

    async fn memberships(&self, equipment_id: i32) -> AppResult<Vec<CategoryMembership>> {
        self.db
            .fetch_all(
                r#"
                SELECT c.*, ec.quantity_in_package, ec.is_required
                FROM categories c
                JOIN equipment_categories ec ON c.id = ec.category_id
                WHERE ec.equipment_id = $1
                ORDER BY c.name
                "#,
                &[equipment_id.into()],
            )
            .await
    }

    /// Package memberships of an item reshaped per category; empty for unknown items
    pub async fn get_package_compatibility(&self, equipment_id: i32) -> Vec<PackageCompatibility> {
        self.compatibility(equipment_id)
            .await
            .or_neutral(format_args!("Error retrieving compatibility for equipment {}", equipment_id))
    }

    async fn compatibility(&self, equipment_id: i32) -> AppResult<Vec<PackageCompatibility>> {
        let Some(equipment) = self
            .db
            .fetch_optional::<Equipment>("SELECT * FROM equipment WHERE id = $1", &[equipment_id.into()])
            .await?
        else {
            return Ok(Vec::new());
        };

        Ok(self
            .memberships(equipment_id)
            .await?
            .into_iter()
            .map(|membership| PackageCompatibility::new(membership, equipment.clone()))
            .collect())
    }
}

impl Repository {
    pub async fn add_equipment_to_package(
        &self,
        equipment_id: i32,
        category_id: i32,
        quantity: i32,
        required: bool,
    ) -> bool {
        self.packages
            .add_equipment_to_category(equipment_id, category_id, quantity, required)
            .await
    }

    pub async fn get_package_association(&self, equipment_id: i32, category_id: i32) -> Option<EquipmentCategory> {
        self.packages.get_association(equipment_id, category_id).await
    }

    pub async fn remove_equipment_from_package(&self, equipment_id: i32, category_id: i32) -> bool {
        self.packages
            .remove_equipment_from_category(equipment_id, category_id)
            .await
    }

    pub async fn update_package_quantity(&self, equipment_id: i32, category_id: i32, quantity: i32) -> bool {
        self.packages
            .update_package_quantity(equipment_id, category_id, quantity)
            .await
    }

    pub async fn update_package_requirement(&self, equipment_id: i32, category_id: i32, required: bool) -> bool {
        self.packages
            .update_package_requirement(equipment_id, category_id, required)
            .await
    }

    pub async fn get_package_details(&self, category_id: i32) -> Option<PackageDetails> {
        self.packages.get_package_details(category_id).await
    }

    pub async fn get_equipment_compatibility(&self, equipment_id: i32) -> Vec<PackageCompatibility> {
        self.packages.get_package_compatibility(equipment_id).await
    }

    /// All packages containing an item
    pub async fn get_equipment_in_packages(&self, equipment_id: i32) -> Vec<CategoryMembership> {
        self.packages.get_equipment_categories(equipment_id).await
    }

    /// Package details for every category matching the category search
    pub async fn search_packages(&self, query: &str) -> Vec<PackageDetails> {
        let categories = self.search_categories(query).await;
        self.details_for(&categories).await
    }

    pub async fn get_packages_by_audience_and_size(
        &self,
        target_audience: &str,
        event_size: &str,
    ) -> Vec<PackageDetails> {
        let categories: Vec<Category> = self
            .get_categories_by_audience(target_audience)
            .await
            .into_iter()
            .filter(|c| c.typical_event_size.as_deref() == Some(event_size))
            .collect();
        self.details_for(&categories).await
    }

    async fn details_for(&self, categories: &[Category]) -> Vec<PackageDetails> {
        let mut packages = Vec::with_capacity(categories.len());
        for category in categories {
            if let Some(details) = self.get_package_details(category.id).await {
                packages.push(details);
            }
        }
        packages
    }

    /// Create a category and attach each listed item.
    ///
    /// Items that cannot be attached are logged and skipped; the result
    /// reflects what was actually stored.
    pub async fn create_package_from_equipment_list(
        &self,
        category_data: Payload,
        items: &[PackageItem],
    ) -> Option<PackageDetails> {
        let category = self.create_category(category_data).await?;

        for item in items {
            if !self
                .add_equipment_to_package(item.equipment_id, category.id, item.quantity, item.required)
                .await
            {
                tracing::warn!(
                    "Failed to add equipment {} to category {}",
                    item.equipment_id,
                    category.id
                );
            }
        }

        tracing::info!("Created package {} with {} requested items", category.id, items.len());
        self.get_package_details(category.id).await
    }

    /// Copy a package's associations into a newly created category
    pub async fn duplicate_package(
        &self,
        source_category_id: i32,
        new_category_data: Payload,
    ) -> Option<PackageDetails> {
        let Some(source) = self.get_package_details(source_category_id).await else {
            tracing::warn!("Source package {} not found", source_category_id);
            return None;
        };
        let category = self.create_category(new_category_data).await?;

        for item in &source.equipment {
            if !self
                .add_equipment_to_package(
                    item.equipment.id,
                    category.id,
                    item.quantity_in_package,
                    item.is_required,
                )
                .await
            {
                tracing::warn!(
                    "Failed to copy equipment {} into category {}",
                    item.equipment.id,
                    category.id
                );
            }
        }

        tracing::info!("Duplicated package {} as {}", source_category_id, category.id);
        self.get_package_details(category.id).await
    }
}
