//! Mappers for the nested line items of transactions.

use crate::reference::{ReferenceIndex, ReferenceRequest};

use super::{
    amount::Amount,
    common::map_line_tax_code,
    error::{MappingError, MappingResult},
    lines::{
        AccountBasedExpenseLineDetail, DepositLineDetail, ItemBasedExpenseLineDetail,
        JournalEntryLineDetail, Line, LineDetail, PostingEntity, PostingEntityType, PostingType,
        SalesItemLineDetail,
    },
    record::UnifiedRecord,
    resolve::{
        ACCOUNT, CLASS, CUSTOMER, DEPARTMENT, ITEM, PROJECT, PROJECT_ALIASES, TAX_CODE, VENDOR,
    },
};

/// Request the references used by `lineItems` and `expenses` on purchases.
pub fn collect_purchase_references(record: &UnifiedRecord, request: &mut ReferenceRequest) {
    for key in ["lineItems", "expenses"] {
        request.collect_list(record, key, &[ITEM, ACCOUNT, PROJECT, TAX_CODE, CLASS]);
    }
}

fn quantity_times_price(
    qty: Option<Amount>,
    unit_price: Option<Amount>,
) -> MappingResult<Amount> {
    qty.unwrap_or(Amount::ONE)
        .checked_mul(unit_price.unwrap_or(Amount::ZERO))
        .ok_or_else(|| MappingError::invalid("amount out of range"))
}

/// A product line on an invoice.
pub fn sales_item_line(line: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Line> {
    let detail = SalesItemLineDetail {
        item_ref: ITEM.resolve_reference(index, line)?,
        tax_code_ref: map_line_tax_code(line)?,
        class_ref: CLASS.resolve_reference(index, line)?,
        discount_amt: line.amount("discount")?,
        qty: line.amount("quantity")?,
        unit_price: line.amount("unitPrice")?,
        service_date: line.text("serviceDate"),
    };

    Ok(Line {
        description: line.text("description"),
        amount: Some(quantity_times_price(detail.qty, detail.unit_price)?),
        detail: LineDetail::SalesItem(detail),
    })
}

/// A product line on a bill, purchase order or vendor credit.
///
/// When the line names an account that resolves, it is booked as an
/// account-based expense for its stated amount. Otherwise it is an item-based
/// expense for quantity times unit price. The line's project is its customer.
pub fn product_line(line: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Line> {
    let line = line.with_aliases(PROJECT_ALIASES);

    if let Some(account) = ACCOUNT.find(index, &line) {
        let qty = line.amount("quantity")?;
        let unit_price = line.amount("unitPrice")?;
        let amount = match line.amount("amount")? {
            Some(amount) => amount,
            None => quantity_times_price(qty, unit_price)?,
        };

        let detail = AccountBasedExpenseLineDetail {
            account_ref: Some(ACCOUNT.reference(account)),
            customer_ref: CUSTOMER.resolve_reference(index, &line)?,
            tax_code_ref: TAX_CODE.find(index, &line).map(|tax| TAX_CODE.reference(tax)),
            class_ref: CLASS.resolve_reference(index, &line)?,
            qty,
            unit_price,
        };

        return Ok(Line {
            description: line.text("description"),
            amount: Some(amount),
            detail: LineDetail::AccountBasedExpense(detail),
        });
    }

    // An account that was named but not found is only reported when there is
    // no item to fall back to.
    if !ITEM.is_present(&line) && ACCOUNT.is_present(&line) {
        return Err(ACCOUNT.not_found(&line));
    }

    let detail = ItemBasedExpenseLineDetail {
        item_ref: ITEM.resolve_reference(index, &line)?,
        customer_ref: CUSTOMER.resolve_reference(index, &line)?,
        tax_code_ref: TAX_CODE.find(index, &line).map(|tax| TAX_CODE.reference(tax)),
        class_ref: CLASS.resolve_reference(index, &line)?,
        qty: line.amount("quantity")?,
        unit_price: line.amount("unitPrice")?,
    };

    Ok(Line {
        description: line.text("description"),
        amount: Some(quantity_times_price(detail.qty, detail.unit_price)?),
        detail: LineDetail::ItemBasedExpense(detail),
    })
}

/// An expense line, always booked against an account for its stated amount.
pub fn expense_line(expense: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Line> {
    let expense = expense.with_aliases(PROJECT_ALIASES);

    let detail = AccountBasedExpenseLineDetail {
        account_ref: ACCOUNT.resolve_reference(index, &expense)?,
        customer_ref: CUSTOMER.resolve_reference(index, &expense)?,
        tax_code_ref: TAX_CODE
            .find(index, &expense)
            .map(|tax| TAX_CODE.reference(tax)),
        class_ref: CLASS.resolve_reference(index, &expense)?,
        qty: None,
        unit_price: None,
    };

    Ok(Line {
        description: expense.text("description"),
        amount: expense.amount("amount")?,
        detail: LineDetail::AccountBasedExpense(detail),
    })
}

/// A journal entry line.
///
/// The line posts against its customer, or its vendor when it has no
/// customer. The amount is the absolute value of the credit or debit amount
/// matching the entry type.
pub fn journal_entry_line(line: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Line> {
    let customer = CUSTOMER.resolve_reference(index, line)?;
    let vendor = VENDOR.resolve_reference(index, line)?;

    let entity = match (customer, vendor) {
        (Some(customer), _) => PostingEntity {
            entity_type: PostingEntityType::Customer,
            entity_ref: customer,
        },
        (None, Some(vendor)) => PostingEntity {
            entity_type: PostingEntityType::Vendor,
            entity_ref: vendor,
        },
        (None, None) => {
            return Err(MappingError::not_found(
                "No customer or vendor found for the journal entry line item",
            ))
        }
    };

    let entry_type = line.text("entryType");
    let (posting_type, amount_field) = match entry_type.as_deref() {
        Some("Debit") => (PostingType::Debit, "debitAmount"),
        Some("Credit") => (PostingType::Credit, "creditAmount"),
        other => {
            return Err(MappingError::invalid(format!(
                "'{}' is an invalid field value for 'entryType'. It should be one of 'Credit' or 'Debit'",
                other.unwrap_or("None")
            )))
        }
    };

    let detail = JournalEntryLineDetail {
        posting_type,
        entity,
        account_ref: ACCOUNT.resolve_reference(index, line)?,
        class_ref: CLASS.resolve_reference(index, line)?,
        department_ref: DEPARTMENT.resolve_reference(index, line)?,
    };

    Ok(Line {
        description: line.text("description"),
        amount: Some(line.amount(amount_field)?.unwrap_or_default().abs()),
        detail: LineDetail::JournalEntry(detail),
    })
}

/// A deposit line. The class is attached only when it resolves.
pub fn deposit_line(line: &UnifiedRecord, index: &ReferenceIndex) -> MappingResult<Line> {
    let detail = DepositLineDetail {
        account_ref: ACCOUNT.resolve_reference(index, line)?,
        entity: CUSTOMER.resolve_reference(index, line)?,
        class_ref: CLASS.find(index, line).map(|class| CLASS.reference(class)),
    };

    Ok(Line {
        description: line.text("description"),
        amount: line.amount("amount")?,
        detail: LineDetail::Deposit(detail),
    })
}
