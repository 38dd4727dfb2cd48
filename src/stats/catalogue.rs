//! The default set of Waldur statistics, in collection order.

use super::descriptor::StatDescriptor;

const ORGANIZATION: &[(&str, &str)] = &[
    ("abbreviation", "abbreviation"),
    ("name", "name"),
    ("uuid", "uuid"),
];

const SERVICE_PROVIDER: &[(&str, &str)] = &[
    ("customer_uuid", "customer_uuid"),
    ("customer_name", "customer_name"),
];

const OFFERING: &[(&str, &str)] = &[
    ("offering_uuid", "offering_uuid"),
    ("offering_name", "offering_name"),
];

/// The default set of statistics, in collection order.
///
/// `registration_methods` selects the label values of
/// `waldur_users_by_registration_method`.
pub fn catalogue(registration_methods: &[String]) -> Vec<StatDescriptor> {
    let registration_variants = registration_methods
        .iter()
        .map(|method| {
            (
                method.clone(),
                vec![("registration_method".to_string(), method.clone())],
            )
        })
        .collect();

    vec![
        // Scalar counts
        StatDescriptor::count(
            "waldur_users_total",
            "Total count of users in Waldur instance",
            "users",
            &[],
        ),
        StatDescriptor::count(
            "waldur_staff_users_total",
            "Total count of staff users in Waldur instance",
            "users",
            &[("is_staff", "true")],
        ),
        StatDescriptor::count(
            "waldur_support_users_total",
            "Total count of support users in Waldur instance",
            "users",
            &[("is_support", "true")],
        ),
        StatDescriptor::count_by(
            "waldur_users_by_registration_method",
            "Count of users in Waldur instance by registration method",
            "registration_method",
            "users",
            registration_variants,
        ),
        StatDescriptor::count(
            "waldur_customers_total",
            "Total count of organizations in Waldur instance",
            "customers",
            &[],
        ),
        StatDescriptor::count(
            "waldur_projects_total",
            "Total count of projects in Waldur instance",
            "projects",
            &[],
        ),
        StatDescriptor::count(
            "waldur_marketplace_resources_total",
            "Total count of marketplace resources in Waldur instance",
            "marketplace-resources",
            &[],
        ),
        StatDescriptor::count(
            "waldur_marketplace_active_resources_total",
            "Total count of active marketplace resources in Waldur instance",
            "marketplace-resources",
            &[("state", "OK"), ("state", "Updating"), ("state", "Terminating")],
        ),
        // Breakdowns
        StatDescriptor::rows(
            "organization_project_count",
            "Count of projects per organization",
            "organization_project_count",
            ORGANIZATION,
            "count",
        ),
        StatDescriptor::rows(
            "organization_resource_count",
            "Count of marketplace resources per organization",
            "organization_resource_count",
            ORGANIZATION,
            "count",
        ),
        StatDescriptor::merged(
            "organization_member_count",
            "Count of organization and project members per organization",
            &["customer_member_count", "project_member_count"],
            ORGANIZATION,
            "count",
        ),
        StatDescriptor::rows(
            "resources_limits",
            "Sum of resource limits per offering",
            "resources_limits",
            &[
                ("offering_uuid", "offering_uuid"),
                ("offering_country", "offering_country"),
                ("organization_group_name", "organization_group_name"),
                ("name", "name"),
            ],
            "value",
        ),
        StatDescriptor::rows(
            "component_usages",
            "Usage of offering components in the current month",
            "component_usages",
            &[
                ("offering_uuid", "offering_uuid"),
                ("component_type", "component_type"),
            ],
            "usage",
        ),
        StatDescriptor::rows(
            "count_users_of_service_providers",
            "Count of users connected to resources of each service provider",
            "count_users_of_service_providers",
            SERVICE_PROVIDER,
            "count",
        ),
        StatDescriptor::rows(
            "count_projects_of_service_providers",
            "Count of projects with resources of each service provider",
            "count_projects_of_service_providers",
            SERVICE_PROVIDER,
            "count",
        ),
        StatDescriptor::rows(
            "count_active_resources_grouped_by_offering",
            "Count of active resources per offering",
            "count_active_resources_grouped_by_offering",
            OFFERING,
            "count",
        )
        .with_total(
            "total_active_resources_count",
            "Total count of active resources across all offerings",
        ),
        StatDescriptor::rows(
            "count_active_resources_grouped_by_offering_country",
            "Count of active resources per offering country",
            "count_active_resources_grouped_by_offering_country",
            &[("country", "country")],
            "count",
        ),
        StatDescriptor::rows(
            "count_active_resources_grouped_by_organization_group",
            "Count of active resources per organization group",
            "count_active_resources_grouped_by_organization_group",
            &[("organization_group_name", "organization_group_name")],
            "count",
        ),
        StatDescriptor::rows(
            "count_projects_grouped_by_oecd_fos",
            "Count of projects per OECD field of science",
            "count_projects_grouped_by_oecd_fos",
            &[("oecd_fos_code", "oecd")],
            "count",
        ),
        StatDescriptor::rows(
            "total_cost_of_active_resources_per_offering",
            "Total cost of active resources per offering",
            "total_cost_of_active_resources_per_offering",
            OFFERING,
            "cost",
        ),
        StatDescriptor::nested(
            "projects_usages_grouped_by_oecd_fos",
            "Component usages of projects per OECD field of science",
            "projects_usages_grouped_by_oecd_fos",
            "oecd_fos_code",
            "usage_type",
        ),
        StatDescriptor::nested(
            "projects_limits_grouped_by_oecd_fos",
            "Component limits of projects per OECD field of science",
            "projects_limits_grouped_by_oecd_fos",
            "oecd_fos_code",
            "limit_type",
        ),
    ]
}
