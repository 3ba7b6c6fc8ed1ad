//! The model-form view mixin with nested formset support.
//!
//! [`ModelFormFormsetMixin`] drives the two phases of an edit page. On
//! `get` the parent form is built with unbound formsets. On `post` every
//! formset declared on the form's helper is built from the submitted data
//! and attached, the whole structure is validated, and on success the
//! parent record is saved before each formset.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crispy_ext_core::CrispyResult;
use crispy_ext_forms::container::{FormsetContainer, FormsetKwargs};
use crispy_ext_forms::form::Form;
use crispy_ext_forms::model_form::{Instance, ModelForm};

use crate::request::{redirect, FormRequest, Response};

/// What a view handler produced.
pub enum FormOutcome<F> {
    /// The form and its formsets were saved.
    Redirect(Response),
    /// Validation failed; the form carries every error.
    Invalid(F),
    /// A fresh form for display.
    Unbound(F),
}

impl<F> fmt::Debug for FormOutcome<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redirect(response) => f.debug_tuple("Redirect").field(&response.status()).finish(),
            Self::Invalid(_) => f.write_str("Invalid(..)"),
            Self::Unbound(_) => f.write_str("Unbound(..)"),
        }
    }
}

impl<F> FormOutcome<F> {
    /// The form, unless the outcome is a redirect.
    pub fn into_form(self) -> Option<F> {
        match self {
            Self::Redirect(_) => None,
            Self::Invalid(form) | Self::Unbound(form) => Some(form),
        }
    }
}

/// Adds nested formsets to a model-form edit view.
///
/// Implementors supply the form, the record being edited, and where to go
/// after saving. The default methods take care of the formsets declared on
/// the form's [`FormHelper`](crispy_ext_forms::helper::FormHelper).
#[async_trait]
pub trait ModelFormFormsetMixin: Send + Sync {
    /// The parent form. Wrap it in
    /// [`ModelFormWithFormsets`](crispy_ext_forms::model_form::ModelFormWithFormsets)
    /// so validation covers the formsets.
    type Form: ModelForm + 'static;

    /// The record being edited, `None` on create views.
    fn object(&self) -> Option<&Instance>;

    /// Replaces the record being edited.
    fn set_object(&mut self, object: Option<Instance>);

    /// Builds the parent form, bound to the request when it carries data.
    fn construct_form(&self, request: &FormRequest) -> Self::Form;

    /// Where to redirect after a successful save.
    fn success_url(&self) -> String;

    /// The containers declared on the form; none without a helper.
    fn get_formset_containers(&self, form: &Self::Form) -> Vec<Arc<dyn FormsetContainer>> {
        form.helper()
            .map(|helper| helper.formsets.clone())
            .unwrap_or_default()
    }

    /// Arguments shared by every formset: the current record, plus the
    /// payload for `POST` and `PUT` requests.
    fn get_formset_kwargs(&self, request: &FormRequest) -> FormsetKwargs {
        let mut kwargs = FormsetKwargs {
            instance: self.object().cloned(),
            ..FormsetKwargs::default()
        };
        if request.has_payload() {
            kwargs.data = Some(request.post.clone());
            kwargs.files = Some(request.files.clone());
        }
        kwargs
    }

    /// Builds the parent form and attaches a formset for each declared
    /// container.
    fn get_form(&self, request: &FormRequest) -> CrispyResult<Self::Form> {
        let base = self.get_formset_kwargs(request);
        let mut form = self.construct_form(request);
        for container in self.get_formset_containers(&form) {
            let mut kwargs = base.clone();
            kwargs.prefix = container.prefix().map(str::to_string);
            let formset = container.construct(kwargs)?;
            tracing::debug!(
                form = form.form_name(),
                container = container.name(),
                forms = formset.total_form_count(),
                "Attached formset"
            );
            form.nested_mut().insert_formset(container.name(), formset);
        }
        Ok(form)
    }

    /// Saves each attached formset against `instance`.
    async fn save_formsets(&self, form: &Self::Form, instance: Option<&Instance>) -> CrispyResult<()> {
        for container in self.get_formset_containers(form) {
            if let Some(formset) = container.get_bound(form) {
                container.save(formset, instance).await?;
            }
        }
        Ok(())
    }

    /// Saves the parent record, then the formsets, and redirects.
    async fn form_valid(&mut self, mut form: Self::Form) -> CrispyResult<Response> {
        let saved = form.save().await?;
        self.set_object(Some(saved));
        self.save_formsets(&form, self.object()).await?;
        let url = self.success_url();
        tracing::info!(form = form.form_name(), url = %url, "Saved form with formsets");
        redirect(&url)
    }

    /// Hands the form back for redisplay.
    fn form_invalid(&self, form: Self::Form) -> FormOutcome<Self::Form> {
        tracing::debug!(
            form = form.form_name(),
            errors = form.errors().len(),
            "Form did not validate"
        );
        FormOutcome::Invalid(form)
    }

    /// Handles a read request.
    async fn get(&self, request: &FormRequest) -> CrispyResult<FormOutcome<Self::Form>> {
        Ok(FormOutcome::Unbound(self.get_form(request)?))
    }

    /// Handles a submission.
    async fn post(&mut self, request: &FormRequest) -> CrispyResult<FormOutcome<Self::Form>> {
        let mut form = self.get_form(request)?;
        if form.is_valid().await {
            Ok(FormOutcome::Redirect(self.form_valid(form).await?))
        } else {
            Ok(self.form_invalid(form))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_into_form() {
        let outcome: FormOutcome<u8> = FormOutcome::Redirect(redirect("/done/").unwrap());
        assert!(outcome.into_form().is_none());
        assert_eq!(FormOutcome::Invalid(1u8).into_form(), Some(1));
        assert_eq!(FormOutcome::Unbound(2u8).into_form(), Some(2));
    }

    #[test]
    fn test_outcome_debug() {
        let outcome: FormOutcome<u8> = FormOutcome::Redirect(redirect("/done/").unwrap());
        assert_eq!(format!("{outcome:?}"), "Redirect(302)");
        assert_eq!(format!("{:?}", FormOutcome::Invalid(0u8)), "Invalid(..)");
    }
}
