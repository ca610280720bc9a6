use serde::Serialize;

pub const ADMIN_ROLE: &str = "Admin";

/// One entry in the portal navigation. `name` doubles as the role string
/// stored on Supabase profiles.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SystemModule {
    pub name: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
}

pub const SYSTEM_MODULES: &[SystemModule] = &[
    SystemModule { name: "Administracion", icon: "ph-briefcase", label: "Administración" },
    SystemModule { name: "Almacen", icon: "ph-package", label: "Almacén" },
    SystemModule { name: "Logistica", icon: "ph-truck", label: "Logística" },
    SystemModule { name: "Produccion", icon: "ph-factory", label: "Producción" },
    SystemModule { name: "Diseño", icon: "ph-paint-brush", label: "Diseño" },
    SystemModule { name: "Ventas", icon: "ph-shopping-cart", label: "Ventas" },
    SystemModule { name: "Compras", icon: "ph-shopping-bag", label: "Compras" },
    SystemModule { name: "Recursos Humanos", icon: "ph-users", label: "RRHH" },
    SystemModule { name: "Contabilidad", icon: "ph-currency-dollar", label: "Contabilidad" },
];

/// Filter the system modules down to what the user's roles allow.
pub fn allowed_modules(user_roles: &[String]) -> Vec<SystemModule> {
    if user_roles.iter().any(|r| r == ADMIN_ROLE) {
        return SYSTEM_MODULES.to_vec();
    }
    SYSTEM_MODULES
        .iter()
        .filter(|m| user_roles.iter().any(|r| r == m.name))
        .copied()
        .collect()
}

/// Roles an admin can assign: Admin plus every module name.
pub fn available_roles() -> Vec<&'static str> {
    std::iter::once(ADMIN_ROLE)
        .chain(SYSTEM_MODULES.iter().map(|m| m.name))
        .collect()
}

/// A form tool exposed by a module home screen.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ModuleTool {
    pub name: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub route: &'static str,
}

pub const SALES_TOOLS: &[ModuleTool] = &[ModuleTool {
    name: "cotizador",
    label: "Nueva Cotización",
    icon: "ph-file-plus",
    route: "/api/sales/submit",
}];

pub const LOGISTICS_TOOLS: &[ModuleTool] = &[ModuleTool {
    name: "captura",
    label: "Captura de Materiales",
    icon: "ph-clipboard-text",
    route: "/api/logistics/submit",
}];

pub const DESIGN_TOOLS: &[ModuleTool] = &[ModuleTool {
    name: "accesorios",
    label: "Accesorios y Tornillería",
    icon: "ph-nut",
    route: "/api/design/submit",
}];

pub const PRODUCTION_TOOLS: &[ModuleTool] = &[ModuleTool {
    name: "planeacion",
    label: "Planeación",
    icon: "ph-calendar-blank",
    route: "/api/production/planning",
}];

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn admin_sees_all_modules() {
        let modules = allowed_modules(&roles(&["Admin"]));
        assert_eq!(modules.len(), SYSTEM_MODULES.len());
    }

    #[test]
    fn roles_filter_navigation() {
        let modules = allowed_modules(&roles(&["Ventas", "Logistica"]));
        let names: Vec<_> = modules.iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Logistica", "Ventas"]);
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        assert!(allowed_modules(&roles(&["Intruso"])).is_empty());
        assert!(allowed_modules(&[]).is_empty());
    }

    #[test]
    fn available_roles_covers_admin_and_modules() {
        let all = available_roles();
        assert_eq!(all.len(), SYSTEM_MODULES.len() + 1);
        assert_eq!(all[0], ADMIN_ROLE);
        assert!(all.contains(&"Diseño"));
    }
}
