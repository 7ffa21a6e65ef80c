//! Scenarios for the landing and configuration screens.

use super::ScenarioCtx;
use crate::document::Document;
use crate::error::VerifyResult;
use crate::screens::configuration::{CONFIG_URL, ERROR_MESSAGE, SELECTED_WARRIOR};
use crate::verify;

pub async fn landing<D: Document>(ctx: &ScenarioCtx<'_, D>) -> VerifyResult<()> {
    let landing = ctx.landing()?;
    landing.open().await?;
    landing.verify_loaded().await?;
    landing.verify_content().await?;

    let title = landing.page_title().await?;
    ctx.step(&format!("landing title: {}", title.trim()));

    landing.click_start_quest().await?;
    ctx.configuration()?.verify_loaded().await
}

pub async fn warrior_selection<D: Document>(ctx: &ScenarioCtx<'_, D>) -> VerifyResult<()> {
    let landing = ctx.landing()?;
    landing.open().await?;
    landing.click_start_quest().await?;

    let configuration = ctx.configuration()?;
    configuration.verify_loaded().await?;

    let data = &ctx.config.quest;
    let options = configuration.warrior_option_count().await?;
    verify!(
        options == data.warriors.len(),
        "expected {} warrior options, found {options}",
        data.warriors.len()
    );

    configuration.select_warrior(&data.warrior).await?;
    configuration
        .surface()
        .expect_contains_text(SELECTED_WARRIOR, &data.warrior)
        .await?;
    ctx.step(&format!(
        "selected warrior: {}",
        configuration.selected_warrior().await?
    ));

    configuration
        .complete_configuration(&data.quest_name, &data.quest_description, None)
        .await?;

    let quest = ctx.quest()?;
    quest.verify_loaded().await?;
    quest.verify_warrior_details(&data.warrior).await
}

/// An empty quest name is rejected in place; a valid one goes through.
pub async fn config_validation<D: Document>(ctx: &ScenarioCtx<'_, D>) -> VerifyResult<()> {
    let landing = ctx.landing()?;
    landing.open().await?;
    landing.click_start_quest().await?;

    let configuration = ctx.configuration()?;
    configuration.verify_loaded().await?;

    let data = &ctx.config.quest;
    configuration
        .configure_quest("", &data.quest_description)
        .await?;
    configuration.initiate_adventure().await?;
    configuration.surface().expect_visible(ERROR_MESSAGE).await?;

    verify!(
        !configuration.is_form_valid().await?,
        "form with an empty quest name reported valid"
    );
    let message = configuration.error_message().await?;
    verify!(
        !message.trim().is_empty(),
        "validation error is visible but empty"
    );
    ctx.step(&format!("validation error: {}", message.trim()));

    let document = ctx.document;
    ctx.poller
        .ensure_stable(
            "configuration screen to stay put",
            || document.current_url(),
            |url| CONFIG_URL.is_match(url),
        )
        .await?;

    configuration
        .complete_configuration(&data.quest_name, &data.quest_description, None)
        .await?;
    configuration.surface().expect_hidden(ERROR_MESSAGE).await?;
    ctx.quest()?.verify_loaded().await
}
