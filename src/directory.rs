// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory tenant directory.
//!
//! Backs the classifier and the CRUD services with a relational-style
//! store of plans, companies, employees and roles. Shared behind the
//! application state's `RwLock`; the write lock serializes mutation, so
//! check-then-insert sequences (unique fields, duplicate role
//! assignment) cannot race.

use std::collections::HashMap;

use crate::error::ApiError;
use crate::models::{Company, Employee, Role, SubscriptionPlan};

#[derive(Default)]
pub struct Directory {
    plans: HashMap<String, SubscriptionPlan>,
    companies: HashMap<String, Company>,
    employees: HashMap<String, Employee>,
    roles: HashMap<String, Role>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Subscription plans
    // ------------------------------------------------------------------

    pub fn find_plan_by_id(&self, id: &str) -> Option<SubscriptionPlan> {
        self.plans.get(id).cloned()
    }

    pub fn find_plan_by_name(&self, name: &str) -> Option<SubscriptionPlan> {
        self.plans.values().find(|p| p.name == name).cloned()
    }

    pub fn list_plans(&self, active_only: bool) -> Vec<SubscriptionPlan> {
        let mut plans: Vec<_> = self
            .plans
            .values()
            .filter(|p| !active_only || p.is_active)
            .cloned()
            .collect();
        plans.sort_by(|a, b| a.name.cmp(&b.name));
        plans
    }

    /// Number of companies referencing a plan, soft-deleted ones included.
    pub fn companies_on_plan(&self, plan_id: &str) -> usize {
        self.companies
            .values()
            .filter(|c| c.subscription.id == plan_id)
            .count()
    }

    pub fn insert_plan(&mut self, plan: SubscriptionPlan) -> Result<(), ApiError> {
        if self.find_plan_by_name(&plan.name).is_some() {
            return Err(ApiError::bad_request(
                "Subscription plan with this name already exists",
            ));
        }
        self.plans.insert(plan.id.clone(), plan);
        Ok(())
    }

    /// Replace a plan and refresh the eager copy embedded in companies.
    pub fn save_plan(&mut self, plan: SubscriptionPlan) {
        for company in self.companies.values_mut() {
            if company.subscription.id == plan.id {
                company.subscription = plan.clone();
            }
        }
        self.plans.insert(plan.id.clone(), plan);
    }

    // ------------------------------------------------------------------
    // Companies
    // ------------------------------------------------------------------

    pub fn find_company_by_id(&self, id: &str) -> Option<Company> {
        self.companies.get(id).cloned()
    }

    pub fn find_company_by_email(&self, email: &str) -> Option<Company> {
        self.companies.values().find(|c| c.email == email).cloned()
    }

    pub fn find_company_by_external_id(&self, external_id: &str) -> Option<Company> {
        self.companies
            .values()
            .find(|c| c.external_user_id == external_id)
            .cloned()
    }

    /// Every company, soft-deleted ones included (super-admin listing).
    pub fn list_companies(&self) -> Vec<Company> {
        let mut companies: Vec<_> = self.companies.values().cloned().collect();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        companies
    }

    pub fn list_active_companies(&self) -> Vec<Company> {
        let mut companies: Vec<_> = self
            .companies
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        companies.sort_by(|a, b| a.name.cmp(&b.name));
        companies
    }

    pub fn insert_company(&mut self, company: Company) -> Result<(), ApiError> {
        if self.find_company_by_email(&company.email).is_some() {
            return Err(ApiError::bad_request(
                "Company with this email already exists",
            ));
        }
        if self.companies.values().any(|c| c.name == company.name) {
            return Err(ApiError::bad_request(
                "Company with this name already exists",
            ));
        }
        self.companies.insert(company.id.clone(), company);
        Ok(())
    }

    pub fn save_company(&mut self, company: Company) {
        self.companies.insert(company.id.clone(), company);
    }

    // ------------------------------------------------------------------
    // Employees
    // ------------------------------------------------------------------

    pub fn find_employee_by_id(&self, id: &str) -> Option<Employee> {
        self.employees.get(id).cloned()
    }

    /// Lookup by email, optionally restricted to one company. Employee
    /// emails are unique only within a company; an unrestricted lookup
    /// returns the first match in insertion-independent (id) order.
    pub fn find_employee_by_email(&self, email: &str, company_id: Option<&str>) -> Option<Employee> {
        let mut matches: Vec<_> = self
            .employees
            .values()
            .filter(|e| e.email == email)
            .filter(|e| company_id.is_none_or(|cid| e.company_id == cid))
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        matches.first().map(|e| (*e).clone())
    }

    pub fn find_employee_by_external_id(&self, external_id: &str) -> Option<Employee> {
        self.employees
            .values()
            .find(|e| e.external_user_id.as_deref() == Some(external_id))
            .cloned()
    }

    pub fn employees_by_company(&self, company_id: &str) -> Vec<Employee> {
        let mut employees: Vec<_> = self
            .employees
            .values()
            .filter(|e| e.company_id == company_id)
            .cloned()
            .collect();
        employees.sort_by(|a, b| a.name.cmp(&b.name));
        employees
    }

    /// Active head count, checked against the plan's `max_employees`.
    pub fn count_employees(&self, company_id: &str) -> usize {
        self.employees
            .values()
            .filter(|e| e.company_id == company_id && e.is_active)
            .count()
    }

    pub fn insert_employee(&mut self, employee: Employee) -> Result<(), ApiError> {
        if self
            .find_employee_by_email(&employee.email, Some(&employee.company_id))
            .is_some()
        {
            return Err(ApiError::bad_request(
                "Employee with this email already exists in the company",
            ));
        }
        self.employees.insert(employee.id.clone(), employee);
        Ok(())
    }

    pub fn save_employee(&mut self, employee: Employee) {
        self.employees.insert(employee.id.clone(), employee);
    }

    // ------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------

    pub fn find_role_by_id(&self, id: &str) -> Option<Role> {
        self.roles.get(id).cloned()
    }

    pub fn find_role_by_name(&self, name: &str, company_id: &str) -> Option<Role> {
        self.roles
            .values()
            .find(|r| r.name == name && r.company_id == company_id)
            .cloned()
    }

    pub fn find_roles_by_company(&self, company_id: &str) -> Vec<Role> {
        let mut roles: Vec<_> = self
            .roles
            .values()
            .filter(|r| r.company_id == company_id)
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    /// Resolve the role records behind an employee's `role_ids`. Missing
    /// ids are skipped.
    pub fn roles_for_employee(&self, employee: &Employee) -> Vec<Role> {
        employee
            .role_ids
            .iter()
            .filter_map(|id| self.roles.get(id))
            .cloned()
            .collect()
    }

    pub fn employees_with_role(&self, role_id: &str) -> Vec<Employee> {
        let mut employees: Vec<_> = self
            .employees
            .values()
            .filter(|e| e.role_ids.iter().any(|id| id == role_id))
            .cloned()
            .collect();
        employees.sort_by(|a, b| a.name.cmp(&b.name));
        employees
    }

    pub fn insert_role(&mut self, role: Role) -> Result<(), ApiError> {
        if self.find_role_by_name(&role.name, &role.company_id).is_some() {
            return Err(ApiError::bad_request("Role with this name already exists"));
        }
        self.roles.insert(role.id.clone(), role);
        Ok(())
    }

    pub fn save_role(&mut self, role: Role) {
        self.roles.insert(role.id.clone(), role);
    }

    pub fn delete_role(&mut self, role_id: &str) -> Result<(), ApiError> {
        if self.roles.remove(role_id).is_none() {
            return Err(ApiError::not_found("Role not found"));
        }
        Ok(())
    }
}
